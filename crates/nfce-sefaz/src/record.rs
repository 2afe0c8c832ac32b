//! Extracted receipt records and their output-table row shape

use serde::Serialize;

/// Placeholder for a field the document does not provide
pub const NA: &str = "N/A";

/// Access key reported by the replay source
pub const DEBUG_ACCESS_KEY: &str = "N/A_DEBUG";

fn na() -> String {
    NA.to_string()
}

/// One purchased item. Values are kept exactly as printed on the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineItem {
    #[serde(rename = "Nome Produto")]
    pub name: String,
    #[serde(rename = "Quantidade")]
    pub quantity: String,
    #[serde(rename = "Unidade")]
    pub unit: String,
    #[serde(rename = "Valor Unitário")]
    pub unit_value: String,
    #[serde(rename = "Valor Total Item")]
    pub total: String,
}

/// One receipt. Every field is always present; missing ones hold [`NA`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NfceRecord {
    pub access_key: String,
    pub issuer_name: String,
    pub issuer_cnpj: String,
    pub issuer_address: String,
    /// Currency strings as printed ("150,00"), not normalized
    pub total: String,
    pub discount: String,
    pub payable: String,
    pub items: Vec<LineItem>,
    pub consumer_name: String,
    pub consumer_cpf: String,
    pub consumer_address: String,
    pub link: String,
}

impl NfceRecord {
    /// Record for `link` with every field set to [`NA`] and no items
    pub fn empty(link: &str) -> Self {
        Self {
            access_key: na(),
            issuer_name: na(),
            issuer_cnpj: na(),
            issuer_address: na(),
            total: na(),
            discount: na(),
            payable: na(),
            items: Vec::new(),
            consumer_name: na(),
            consumer_cpf: na(),
            consumer_address: na(),
            link: link.to_string(),
        }
    }

    /// Flatten into an output row; the items become one JSON cell.
    pub fn to_row(&self) -> OutputRow<'_> {
        OutputRow {
            access_key: &self.access_key,
            issuer_name: &self.issuer_name,
            issuer_cnpj: &self.issuer_cnpj,
            issuer_address: &self.issuer_address,
            total: &self.total,
            discount: &self.discount,
            payable: &self.payable,
            items: items_json(&self.items),
            consumer_name: &self.consumer_name,
            consumer_cpf: &self.consumer_cpf,
            consumer_address: &self.consumer_address,
            link: &self.link,
        }
    }
}

/// Serialize line items as a self-contained JSON array.
pub fn items_json(items: &[LineItem]) -> String {
    // Vec of plain string structs cannot fail to serialize
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

/// Output table row. Header names match tables produced by earlier versions,
/// so new runs keep appending to the same file.
#[derive(Debug, Serialize)]
pub struct OutputRow<'a> {
    #[serde(rename = "Chave de Acesso")]
    pub access_key: &'a str,
    #[serde(rename = "Nome Emitente")]
    pub issuer_name: &'a str,
    #[serde(rename = "CNPJ Emitente")]
    pub issuer_cnpj: &'a str,
    #[serde(rename = "Endereco Emitente")]
    pub issuer_address: &'a str,
    #[serde(rename = "Valor Total Nota (Produtos/Serviços)")]
    pub total: &'a str,
    #[serde(rename = "Descontos")]
    pub discount: &'a str,
    #[serde(rename = "Valor a Pagar")]
    pub payable: &'a str,
    #[serde(rename = "Itens da Nota")]
    pub items: String,
    #[serde(rename = "Nome Consumidor")]
    pub consumer_name: &'a str,
    #[serde(rename = "CPF Consumidor")]
    pub consumer_cpf: &'a str,
    #[serde(rename = "Endereco Consumidor")]
    pub consumer_address: &'a str,
    #[serde(rename = "Link Original")]
    pub link: &'a str,
}

/// Output table header, in column order
pub const COLUMNS: [&str; 12] = [
    "Chave de Acesso",
    "Nome Emitente",
    "CNPJ Emitente",
    "Endereco Emitente",
    "Valor Total Nota (Produtos/Serviços)",
    "Descontos",
    "Valor a Pagar",
    "Itens da Nota",
    "Nome Consumidor",
    "CPF Consumidor",
    "Endereco Consumidor",
    "Link Original",
];

#[cfg(test)]
mod tests {
    use super::*;

    fn item(name: &str) -> LineItem {
        LineItem {
            name: name.to_string(),
            quantity: "2".to_string(),
            unit: "UN".to_string(),
            unit_value: "3,50".to_string(),
            total: "7,00".to_string(),
        }
    }

    #[test]
    fn empty_record_is_all_sentinels() {
        let r = NfceRecord::empty("https://x");
        for field in [
            &r.access_key,
            &r.issuer_name,
            &r.issuer_cnpj,
            &r.issuer_address,
            &r.total,
            &r.discount,
            &r.payable,
            &r.consumer_name,
            &r.consumer_cpf,
            &r.consumer_address,
        ] {
            assert_eq!(field, NA);
        }
        assert!(r.items.is_empty());
        assert_eq!(r.link, "https://x");
    }

    #[test]
    fn items_json_keeps_keys_and_accents() {
        let json = items_json(&[item("PÃO FRANCÊS")]);
        assert_eq!(
            json,
            r#"[{"Nome Produto":"PÃO FRANCÊS","Quantidade":"2","Unidade":"UN","Valor Unitário":"3,50","Valor Total Item":"7,00"}]"#
        );
    }

    #[test]
    fn items_json_empty() {
        assert_eq!(items_json(&[]), "[]");
    }

    #[test]
    fn row_header_order_matches_columns() {
        let record = NfceRecord::empty("https://x");
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.serialize(record.to_row()).unwrap();
        let out = String::from_utf8(writer.into_inner().unwrap()).unwrap();
        let header = out.lines().next().unwrap();
        assert_eq!(header, COLUMNS.join(","));
    }
}
