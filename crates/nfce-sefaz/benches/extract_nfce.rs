use nfce_sefaz::{Config, Extractor};

const PAGE: &str = include_str!("../tests/fixtures/nota_rs.html");
const LINK: &str = "https://www.sefaz.rs.gov.br/NFCE/NFCE-COM.aspx?p=4325|2|1|1|AA";

/// Sample page with its item table repeated `n` times
fn page_with_items(n: usize) -> String {
    let start = PAGE.find("<tr id=").expect("fixture has item rows");
    let end = PAGE.find("</table>").expect("fixture has item table");
    let rows = &PAGE[start..end];
    let mut body = String::with_capacity(PAGE.len() + rows.len() * n);
    body.push_str(&PAGE[..start]);
    for _ in 0..n {
        body.push_str(rows);
    }
    body.push_str(&PAGE[end..]);
    body
}

#[divan::bench]
fn extract_sample_page(bencher: divan::Bencher) {
    let config = Config::default();
    let extractor = Extractor::new(&config).unwrap();
    bencher.bench(|| extractor.extract(divan::black_box(PAGE), LINK).unwrap());
}

#[divan::bench(args = [10, 100, 500])]
fn extract_long_receipt(bencher: divan::Bencher, rows: usize) {
    let config = Config::default();
    let extractor = Extractor::new(&config).unwrap();
    let page = page_with_items(rows);
    bencher.bench(|| extractor.extract(divan::black_box(&page), LINK).unwrap());
}

fn main() {
    divan::main();
}
