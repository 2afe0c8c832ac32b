//! NFC-e page → [`NfceRecord`]
//!
//! Each block of the page (access key, issuer, totals, items, consumer) is
//! located independently. A selector that matches nothing leaves its fields at
//! [`NA`] and never stops the other blocks from being read.

use regex::Regex;
use scraper::{ElementRef, Html};

use crate::config::Config;
use crate::error::ExtractionError;
use crate::record::{LineItem, NA, NfceRecord};

/// Labels printed on the SEFAZ-RS page layout
mod label {
    pub const CNPJ: &str = "CNPJ:";
    pub const TOTAL: &str = "Valor total R$:";
    pub const DISCOUNT: &str = "Descontos R$:";
    pub const PAYABLE: &str = "Valor a pagar R$:";
    pub const QUANTITY: &str = "Qtde.:";
    pub const UNIT: &str = "UN:";
    pub const UNIT_VALUE: &str = "Vl. Unit.:";
    pub const CPF: &str = "CPF:";
    pub const NAME: &str = "Nome:";
    pub const STREET: &str = "Logradouro:";
}

const CPF_PATTERN: &str = r"CPF:\s*([\d\.-]+)";

/// How an element is picked out, besides its tag name.
#[derive(Clone, Copy)]
enum Attr<'a> {
    Any,
    Class(&'a str),
    Id(&'a str),
    IdPattern(&'a Regex),
    DataRole(&'a str),
}

impl Attr<'_> {
    fn matches(&self, el: &scraper::node::Element) -> bool {
        match self {
            Self::Any => true,
            Self::Class(c) => el.classes().any(|class| class == *c),
            Self::Id(id) => el.id() == Some(*id),
            Self::IdPattern(re) => el.id().is_some_and(|id| re.is_match(id)),
            Self::DataRole(role) => el.attr("data-role") == Some(*role),
        }
    }
}

/// All descendants of `root` (not `root` itself) named `tag` and matching `attr`, in document order.
fn find_all<'a>(root: ElementRef<'a>, tag: &str, attr: Attr<'_>) -> Vec<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .filter(|el| el.value().name() == tag && attr.matches(el.value()))
        .collect()
}

/// First descendant of `root` named `tag` and matching `attr`.
fn find<'a>(root: ElementRef<'a>, tag: &str, attr: Attr<'_>) -> Option<ElementRef<'a>> {
    root.descendants()
        .skip(1)
        .filter_map(ElementRef::wrap)
        .find(|el| el.value().name() == tag && attr.matches(el.value()))
}

fn text(el: ElementRef<'_>) -> String {
    el.text().collect()
}

fn span<'a>(cell: ElementRef<'a>, class: &str) -> Option<ElementRef<'a>> {
    find(cell, "span", Attr::Class(class))
}

/// Trimmed text of an optional node, or [`NA`]
fn text_or_na(el: Option<ElementRef<'_>>) -> String {
    el.map_or_else(|| NA.to_string(), |e| text(e).trim().to_string())
}

/// Text with every occurrence of `label` removed, trimmed; [`NA`] when absent.
fn labelled_or_na(el: Option<ElementRef<'_>>, label: &str) -> String {
    el.map_or_else(
        || NA.to_string(),
        |e| text(e).replace(label, "").trim().to_string(),
    )
}

/// Free-text address cleanup: newlines to spaces, `" ,"` to `","`, whitespace runs collapsed.
pub fn normalize_address(raw: &str) -> String {
    let s = raw.trim().replace('\n', " ").replace(" ,", ",");
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove all whitespace, including line breaks inside the value.
fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

#[derive(Debug, PartialEq, Eq)]
struct Issuer {
    name: String,
    cnpj: String,
    address: String,
}

#[derive(Debug, PartialEq, Eq)]
struct Totals {
    total: String,
    discount: String,
    payable: String,
}

#[derive(Debug, PartialEq, Eq)]
struct Consumer {
    name: String,
    cpf: String,
    address: String,
}

/// Reusable extractor holding the compiled patterns for one configuration.
pub struct Extractor<'c> {
    config: &'c Config,
    item_row: Regex,
    cpf: Regex,
}

impl<'c> Extractor<'c> {
    pub fn new(config: &'c Config) -> Result<Self, ExtractionError> {
        let item_row = Regex::new(&config.items.row_id_pattern)
            .map_err(|e| ExtractionError::Selector(e.to_string()))?;
        let cpf = Regex::new(CPF_PATTERN).map_err(|e| ExtractionError::Selector(e.to_string()))?;
        Ok(Self {
            config,
            item_row,
            cpf,
        })
    }

    /// Build the record for the page `html` fetched from `link`.
    ///
    /// Pure: the same input always yields the same record.
    pub fn extract(&self, html: &str, link: &str) -> Result<NfceRecord, ExtractionError> {
        let document = Html::parse_document(html);
        let root = document.root_element();
        if !has_content(root) {
            return Err(ExtractionError::Unparseable);
        }

        let Issuer {
            name: issuer_name,
            cnpj: issuer_cnpj,
            address: issuer_address,
        } = self.issuer(root);
        let Totals {
            total,
            discount,
            payable,
        } = self.totals(root);
        let items = self.items(root);
        let Consumer {
            name: consumer_name,
            cpf: consumer_cpf,
            address: consumer_address,
        } = self.consumer(root)?;

        Ok(NfceRecord {
            access_key: self.access_key(root),
            issuer_name,
            issuer_cnpj,
            issuer_address,
            total,
            discount,
            payable,
            items,
            consumer_name,
            consumer_cpf,
            consumer_address,
            link: link.to_string(),
        })
    }

    fn access_key(&self, root: ElementRef<'_>) -> String {
        let class = &self.config.general.access_key_class;
        find(root, "span", Attr::Class(class))
            .map_or_else(|| NA.to_string(), |el| strip_whitespace(&text(el)))
    }

    fn issuer(&self, root: ElementRef<'_>) -> Issuer {
        let sel = &self.config.issuer;
        let mut issuer = Issuer {
            name: NA.to_string(),
            cnpj: NA.to_string(),
            address: NA.to_string(),
        };
        let Some(block) = find(root, "div", Attr::Class(&sel.container_class)) else {
            return issuer;
        };

        issuer.name = text_or_na(find(block, "div", Attr::Id(&sel.name_id)));

        // CNPJ and address share one class: classify by label first, then by position
        let details = find_all(block, "div", Attr::Class(&sel.detail_class));
        if let Some(cnpj) = details.iter().find(|d| text(**d).contains(label::CNPJ)) {
            issuer.cnpj = labelled_or_na(Some(*cnpj), label::CNPJ);
        }
        if let Some(address) = details.get(1) {
            issuer.address = normalize_address(&text(*address));
        }
        issuer
    }

    fn totals(&self, root: ElementRef<'_>) -> Totals {
        let sel = &self.config.totals;
        let mut totals = Totals {
            total: NA.to_string(),
            discount: NA.to_string(),
            payable: NA.to_string(),
        };
        let Some(block) = find(root, "div", Attr::Id(&sel.container_id)) else {
            return totals;
        };

        for row in find_all(block, "div", Attr::Id(&sel.row_id)) {
            let (Some(label_el), Some(value_el)) = (
                find(row, "label", Attr::Any),
                find(row, "span", Attr::Class(&sel.value_class)),
            ) else {
                continue;
            };
            let label_text = text(label_el);
            let value = text(value_el).trim().to_string();

            if label_text.contains(label::TOTAL) {
                totals.total = value;
            } else if label_text.contains(label::DISCOUNT) {
                totals.discount = value;
            } else if label_text.contains(label::PAYABLE) {
                totals.payable = value;
            }
        }
        totals
    }

    fn items(&self, root: ElementRef<'_>) -> Vec<LineItem> {
        let sel = &self.config.items;
        let Some(table) = find(root, "table", Attr::Id(&sel.table_id)) else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for row in find_all(table, "tr", Attr::IdPattern(&self.item_row)) {
            let cells = find_all(row, "td", Attr::Any);
            let [description, value, ..] = cells.as_slice() else {
                log::debug!(
                    "skipping item row {:?}: {} cell(s)",
                    row.value().id().unwrap_or_default(),
                    cells.len()
                );
                continue;
            };
            items.push(LineItem {
                name: text_or_na(span(*description, &sel.name_class)),
                quantity: labelled_or_na(span(*description, &sel.quantity_class), label::QUANTITY),
                unit: labelled_or_na(span(*description, &sel.unit_class), label::UNIT),
                unit_value: labelled_or_na(
                    span(*description, &sel.unit_value_class),
                    label::UNIT_VALUE,
                ),
                total: text_or_na(span(*value, &sel.total_class)),
            });
        }
        items
    }

    fn consumer(&self, root: ElementRef<'_>) -> Result<Consumer, ExtractionError> {
        let sel = &self.config.consumer;
        let mut consumer = Consumer {
            name: NA.to_string(),
            cpf: NA.to_string(),
            address: NA.to_string(),
        };

        let section = find_all(root, "div", Attr::DataRole(&sel.container_role))
            .into_iter()
            .find(|div| {
                find(*div, "h4", Attr::Any).is_some_and(|h4| text(h4).contains(&sel.heading_text))
            });
        let Some(section) = section else {
            return Ok(consumer);
        };

        let list = find(section, "ul", Attr::DataRole(&sel.list_role)).ok_or_else(|| {
            ExtractionError::Structure(format!(
                "consumer section has no ul[data-role={}]",
                sel.list_role
            ))
        })?;

        for li in find_all(list, "li", Attr::Any) {
            let line = text(li);
            if line.contains(label::CPF) {
                if let Some(m) = self.cpf.captures(&line).and_then(|c| c.get(1)) {
                    consumer.cpf = m.as_str().trim().to_string();
                }
            } else if line.contains(label::NAME) {
                consumer.name = normalize_address(&line.replace(label::NAME, ""));
            } else if line.contains(label::STREET) {
                consumer.address = normalize_address(&line.replace(label::STREET, ""));
            }
        }
        Ok(consumer)
    }
}

/// Whether the parse produced anything beyond the implicit html/head/body shell.
fn has_content(root: ElementRef<'_>) -> bool {
    root.descendants().any(|node| match node.value() {
        scraper::Node::Text(t) => !t.trim().is_empty(),
        scraper::Node::Element(el) => !matches!(el.name(), "html" | "head" | "body"),
        _ => false,
    })
}

/// One-shot extraction; prefer [`Extractor`] when processing many pages.
pub fn extract(html: &str, link: &str, config: &Config) -> Result<NfceRecord, ExtractionError> {
    Extractor::new(config)?.extract(html, link)
}
