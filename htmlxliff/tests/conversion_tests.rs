use htmlxliff::{ConvertOptions, Error, html_to_xliff, read_xliff, write_xliff, xliff_to_html};

const PAGE: &str =
    "<html><head><title>Hi</title></head><body><p>Hello <b>World</b></p></body></html>";

#[test]
fn test_example_scenario() {
    let xliff = html_to_xliff(PAGE, &ConvertOptions::new().file_name("page.html"))
        .expect("forward conversion");

    assert!(xliff.contains(r#"<trans-unit id="1" slug="title" tag="title">"#));
    assert!(xliff.contains("<source>Hi</source>"));
    assert!(xliff.contains(r#"<trans-unit id="2" slug="body_2" tag="p">"#));
    assert!(xliff.contains(
        r#"<source>Hello <bpt id="1">&lt;b&gt;</bpt>World<ept id="1">&lt;/b&gt;</ept></source>"#
    ));

    let mut file = read_xliff(&xliff).expect("read back");
    file.units[1].target =
        r#"Bonjour <bpt id="1">&lt;b&gt;</bpt>Monde<ept id="1">&lt;/b&gt;</ept>"#.to_string();
    let edited = write_xliff(&file, &Default::default()).expect("rewrite");

    let html = xliff_to_html(&edited).expect("reverse conversion");
    assert_eq!(
        html,
        "<html><head><title>Hi</title></head><body><p>Bonjour <b>Monde</b></p></body></html>"
    );
}

#[test]
fn test_file_attributes() {
    let xliff = html_to_xliff(
        PAGE,
        &ConvertOptions::new()
            .file_name("page.html")
            .source_language("en-US")
            .target_language("fr-FR"),
    )
    .expect("forward conversion");

    assert!(xliff.starts_with("<?xml version=\"1.0\" encoding=\"utf-8\"?>"));
    assert!(xliff.contains(
        r#"<file original="page.html" source-language="en-US" target-language="fr-FR" datatype="html">"#
    ));
    assert!(xliff.contains("urn:oasis:names:tc:xliff:document:1.2"));
}

#[test]
fn test_sibling_and_nested_ids() {
    let html = "<body><p><b>a<i>b</i>c</b> <b>d</b><br/></p></body>";
    let xliff = html_to_xliff(html, &ConvertOptions::new()).expect("forward conversion");
    let file = read_xliff(&xliff).expect("read");

    assert_eq!(
        file.units[0].source,
        concat!(
            r#"<bpt id="1">&lt;b&gt;</bpt>a"#,
            r#"<bpt id="1">&lt;i&gt;</bpt>b<ept id="1">&lt;/i&gt;</ept>"#,
            r#"c<ept id="1">&lt;/b&gt;</ept> "#,
            r#"<bpt id="2">&lt;b&gt;</bpt>d<ept id="2">&lt;/b&gt;</ept>"#,
            r#"<ph id="1">&lt;br/&gt;</ph>"#,
        )
    );

    let rebuilt = xliff_to_html(&xliff).expect("reverse conversion");
    assert!(rebuilt.contains("<p><b>a<i>b</i>c</b> <b>d</b><br></p>"));
}

#[test]
fn test_reordered_units_give_same_output() {
    let html = "<title>T</title><p>one</p><p>two</p><p>three</p>";
    let xliff = html_to_xliff(html, &ConvertOptions::new()).expect("forward conversion");

    let mut file = read_xliff(&xliff).expect("read");
    for unit in &mut file.units {
        unit.target = format!("[{}]", unit.source);
    }
    let in_order = write_xliff(&file, &Default::default()).expect("write");

    file.units.reverse();
    let reversed = write_xliff(&file, &Default::default()).expect("write");

    let expected = xliff_to_html(&in_order).expect("reverse conversion");
    assert_eq!(xliff_to_html(&reversed).expect("reverse conversion"), expected);
    assert!(expected.contains("<title>[T]</title>"));
    assert!(expected.contains("<p>[one]</p><p>[two]</p><p>[three]</p>"));
}

#[test]
fn test_title_unit_is_not_matched_to_body() {
    let xliff = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file original="p.html" source-language="en" target-language="fr" datatype="html">
    <originalFile>&lt;title&gt;T&lt;/title&gt;&lt;p&gt;one&lt;/p&gt;</originalFile>
    <body>
      <trans-unit id="1" slug="body_1" tag="p"><source>one</source><target>un</target></trans-unit>
      <trans-unit id="0" slug="TITLE" tag="Title"><source>T</source><target>Titre</target></trans-unit>
    </body>
  </file>
</xliff>"#;
    let html = xliff_to_html(xliff).expect("reverse conversion");
    assert!(html.contains("<title>Titre</title>"));
    assert!(html.contains("<p>un</p>"));
}

#[test]
fn test_malformed_xliff_is_invalid_input() {
    let err = xliff_to_html("<xliff><file></body></xliff>").expect_err("must fail");
    assert!(matches!(err, Error::InvalidXliff { .. }), "got {err:?}");
    assert!(err.to_string().starts_with("invalid XLIFF file"));
}

#[test]
fn test_fragment_fallback_is_not_an_error() {
    let nodes = htmlxliff::tokenize_fragment("<i>open</div>close");
    assert_eq!(
        nodes,
        vec![htmlxliff::InlineNode::Text("<i>open</div>close".to_string())]
    );
}

#[test]
fn test_alt_trans_proposals_are_not_applied() {
    let xliff = r#"<?xml version="1.0" encoding="utf-8"?>
<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2">
  <file original="p.html" source-language="en" target-language="fr" datatype="html">
    <originalFile>&lt;p&gt;one&lt;/p&gt;</originalFile>
    <body>
      <trans-unit id="1" slug="body_1" tag="p">
        <source>one</source>
        <target>un</target>
        <alt-trans><source>one</source><target>WRONG</target></alt-trans>
      </trans-unit>
    </body>
  </file>
</xliff>"#;
    let html = xliff_to_html(xliff).expect("reverse conversion");
    assert!(html.contains("<p>un</p>"), "got {html}");
}

#[test]
fn test_control_characters_do_not_shift_units() {
    let html = "<p>\u{1}</p><p>two</p><p>three</p>";
    let xliff = html_to_xliff(html, &ConvertOptions::new()).expect("forward conversion");
    let rebuilt = xliff_to_html(&xliff).expect("reverse conversion");
    assert!(rebuilt.contains("<p></p><p>two</p><p>three</p>"), "got {rebuilt}");
}
