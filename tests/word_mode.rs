// Word mode: per-word styles mapped from a source selection onto a target

mod common;

use common::{body, compose_selecting, root};
use format_copier::apply::apply_word_styles;
use format_copier::error::Error;
use format_copier::extract::extract_word_styles;
use format_copier::snapshot::{StyleMap, Token, WordStyleMap};
use format_copier::style::computed_style;

fn word(pairs: &[(&str, &str)]) -> Token {
    Token::Word {
        style: pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<StyleMap>(),
    }
}

#[test]
fn test_hello_world_onto_foo_bar() {
    let source = compose_selecting(
        r#"<b style="color: red">Hello</b> <i style="color: blue">World</i>"#,
        "Hello World",
    );
    let map = extract_word_styles(&source).unwrap();
    let kinds: Vec<bool> = map.tokens.iter().map(Token::is_word).collect();
    assert_eq!(kinds, vec![true, false, true]);
    assert!(matches!(&map.tokens[1], Token::Space { text, .. } if text == " "));

    let mut target = compose_selecting("Foo Bar", "Foo Bar");
    apply_word_styles(&mut target, Some(&map)).unwrap();

    let root = root(&target);
    let children: Vec<_> = target
        .dom
        .children(root)
        .iter()
        .copied()
        .filter(|&n| !target.dom.text(n).is_some_and(str::is_empty))
        .collect();
    assert_eq!(children.len(), 3);

    let foo = computed_style(&target.dom, children[0]);
    assert_eq!(target.dom.text_content(children[0]), "Foo");
    assert_eq!(foo.font_weight, "700");
    assert_eq!(foo.color, "rgb(255, 0, 0)");
    assert_eq!(foo.font_style, "normal");

    // the space between stays a plain text node
    assert_eq!(target.dom.text(children[1]), Some(" "));

    let bar = computed_style(&target.dom, children[2]);
    assert_eq!(target.dom.text_content(children[2]), "Bar");
    assert_eq!(bar.font_style, "italic");
    assert_eq!(bar.color, "rgb(0, 0, 255)");
    assert_eq!(bar.font_weight, "400");
}

#[test]
fn test_target_text_is_preserved() {
    let map = WordStyleMap {
        tokens: vec![word(&[("color", "rgb(0, 128, 0)")])],
    };
    let mut page = compose_selecting(
        "Dear  <b>all</b>,\tthe\u{a0}<i>quick</i> fox",
        "Dear  all,\tthe\u{a0}quick fox",
    );
    let before = page.dom.text_content(root(&page));
    apply_word_styles(&mut page, Some(&map)).unwrap();
    assert_eq!(page.dom.text_content(root(&page)), before);
    assert_eq!(page.selected_text(), before);
}

#[test]
fn test_last_source_style_sticks() {
    let map = WordStyleMap {
        tokens: vec![
            word(&[("fontWeight", "700")]),
            Token::Space {
                text: "  ".into(),
                style: StyleMap::new(),
            },
            word(&[("textDecorationLine", "underline")]),
        ],
    };
    let mut page = compose_selecting("one two three four", "one two three four");
    apply_word_styles(&mut page, Some(&map)).unwrap();
    insta::assert_snapshot!(body(&page), @r#"<span style="font-weight: 700;">one</span> <span style="text-decoration-line: underline;">two</span> <span style="text-decoration-line: underline;">three</span> <span style="text-decoration-line: underline;">four</span>"#);
}

#[test]
fn test_words_without_source_styles_stay_plain() {
    let map = WordStyleMap {
        tokens: vec![Token::Space {
            text: " ".into(),
            style: StyleMap::new(),
        }],
    };
    let mut page = compose_selecting("alpha beta", "alpha beta");
    apply_word_styles(&mut page, Some(&map)).unwrap();
    assert_eq!(body(&page), "alpha beta");
}

#[test]
fn test_partial_word_selection() {
    let map = WordStyleMap {
        tokens: vec![word(&[("fontStyle", "italic")])],
    };
    let mut page = compose_selecting("unbelievable", "believ");
    apply_word_styles(&mut page, Some(&map)).unwrap();
    assert_eq!(
        body(&page),
        r#"un<span style="font-style: italic;">believ</span>able"#
    );
}

#[test]
fn test_collapsed_or_missing_map_is_a_no_op() {
    let mut page = compose_selecting("nothing changes", "nothing");
    let before = body(&page);
    assert!(matches!(
        apply_word_styles(&mut page, None),
        Err(Error::StoreMiss)
    ));
    let mut range = page.selection.range().unwrap();
    range.collapse_to_end();
    page.selection.add_range(range);
    assert!(matches!(
        extract_word_styles(&page),
        Err(Error::NoSelection(_))
    ));
    assert_eq!(body(&page), before);
}

#[test]
fn test_stored_map_json() {
    let source = compose_selecting(r#"<b>Hi</b> there"#, "Hi ");
    let map = extract_word_styles(&source).unwrap();
    let json = serde_json::to_value(&map).unwrap();
    assert_eq!(json[0]["type"], "word");
    assert_eq!(json[0]["style"]["fontWeight"], "700");
    assert_eq!(json[1]["type"], "space");
    assert_eq!(json[1]["text"], " ");
    assert!(json[0].get("text").is_none());

    let back: WordStyleMap = serde_json::from_value(json).unwrap();
    assert_eq!(back, map);
}
