//! HTML <-> XLIFF 1.2 transcoding.
//!
//! htmlxliff provides:
//! - **Segmentation**: the page title and each top-level body child with
//!   visible text become one `trans-unit`
//! - **Inline codes**: markup inside a segment becomes `<bpt>`/`<ept>`/`<ph>`
//!   placeholders, and is restored from them on the way back
//! - **Reconstruction**: translations are overlaid on the original HTML,
//!   which travels inside the XLIFF file as `originalFile`
//!
//! # Example
//!
//! ```rust
//! use htmlxliff::{ConvertOptions, html_to_xliff, xliff_to_html};
//!
//! let html = "<html><head><title>Hi</title></head><body><p>Hello <b>World</b></p></body></html>";
//! let xliff = html_to_xliff(html, &ConvertOptions::new().file_name("page.html")).unwrap();
//! assert!(xliff.contains(r#"<trans-unit id="2" slug="body_2" tag="p">"#));
//!
//! // No target filled in: every unit falls back to its source
//! let back = xliff_to_html(&xliff).unwrap();
//! assert_eq!(back, html);
//! ```

mod tracing_macros;

pub mod convert;
pub mod dom;
mod error;
pub mod inline;
pub mod segment;
pub mod serialize;
pub mod xliff;

pub use convert::{ConvertOptions, apply_translations, build_xliff, html_to_xliff, xliff_to_html};
pub use dom::{Document, parse};
pub use error::{Error, Result};
pub use inline::{InlineNode, revert_inline, tokenize_fragment};
pub use segment::{Segment, extract_segments};
pub use serialize::serialize_document;
pub use xliff::{TransUnit, WriteOptions, XliffFile, read_xliff, write_xliff};
