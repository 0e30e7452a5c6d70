use divan::{Bencher, black_box};
use htmlxliff::{ConvertOptions, html_to_xliff, xliff_to_html};

fn main() {
    divan::main();
}

const SMALL_HTML: &str = include_str!("../tests/roundtrip-cases/simple.html");
const MEDIUM_HTML: &str = include_str!("../tests/roundtrip-cases/inline-markup.html");

/// A long page built from repeated paragraphs with inline markup.
fn large_html() -> String {
    let mut html = String::from("<!DOCTYPE html><html><head><title>Large</title></head><body>");
    for i in 0..500 {
        html.push_str(&format!(
            "<p id=\"p{i}\">Paragraph {i} with <b>bold</b>, <a href=\"/x/{i}\">a link</a> and a break<br>here.</p>\n"
        ));
    }
    html.push_str("</body></html>");
    html
}

#[divan::bench]
fn html_to_xliff_small(bencher: Bencher) {
    let opts = ConvertOptions::new();
    bencher.bench_local(|| black_box(html_to_xliff(black_box(SMALL_HTML), &opts)));
}

#[divan::bench]
fn html_to_xliff_medium(bencher: Bencher) {
    let opts = ConvertOptions::new();
    bencher.bench_local(|| black_box(html_to_xliff(black_box(MEDIUM_HTML), &opts)));
}

#[divan::bench]
fn html_to_xliff_large(bencher: Bencher) {
    let html = large_html();
    let opts = ConvertOptions::new();
    bencher.bench_local(|| black_box(html_to_xliff(black_box(&html), &opts)));
}

#[divan::bench]
fn xliff_to_html_large(bencher: Bencher) {
    let Ok(xliff) = html_to_xliff(&large_html(), &ConvertOptions::new()) else {
        panic!("benchmark input failed to convert");
    };
    bencher.bench_local(|| black_box(xliff_to_html(black_box(&xliff))));
}
