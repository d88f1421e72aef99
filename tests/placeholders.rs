use docxside_forms::field::{FieldKind, OptionKey, parse_placeholder};
use docxside_forms::sanitize::sanitize;
use docxside_forms::token::{normalize_option_key, normalize_placeholder_token, recognize};
use docxside_forms::FieldError;

#[test]
fn sanitize_is_idempotent() {
    let samples = [
        "",
        "plain text",
        "{{text\u{200B}box:na\u{00AD}me}}",
        "\u{FEFF}\u{FEFF}\u{200D}",
        "tab\tand\nnewline",
        "é\u{2060}ü",
    ];
    for s in samples {
        let once = sanitize(s);
        assert_eq!(sanitize(&once), once, "sample {s:?}");
    }
    assert_eq!(sanitize("a\u{200B}b\u{200E}c"), "abc");
}

#[test]
fn clean_tokens_survive_repair() {
    let tokens = [
        "textbox:fullname|required",
        "combobox:country|options:NO,SE,DK|default:SE",
        "radiobutton:gender|value:Male",
        "checkbox:agree",
    ];
    for token in tokens {
        assert_eq!(normalize_placeholder_token(token), token);
        let spaced = format!("{{{{ {} }}}}", token.replace('|', " | "));
        assert_eq!(normalize_placeholder_token(&spaced), token, "spaced {spaced:?}");
    }
}

#[test]
fn missing_separator_is_restored() {
    let repaired = normalize_placeholder_token("textbox:nameoptions:a,b");
    assert_eq!(repaired, "textbox:name|options:a,b");

    let spec = parse_placeholder("textbox:nameoptions:a,b").unwrap();
    assert_eq!(spec.name, "name");
    assert_eq!(spec.option(&OptionKey::Options), Some("a,b"));
}

#[test]
fn longest_option_key_wins() {
    let repaired = normalize_placeholder_token("textbox:notesrowheight:40");
    assert_eq!(repaired, "textbox:notes|rowheight:40");
}

#[test]
fn fuzzy_option_keys() {
    assert_eq!(normalize_option_key("Ivalue").as_deref(), Some("value"));
    assert_eq!(normalize_option_key("reqiured").as_deref(), Some("required"));
    assert_eq!(normalize_option_key("xyz123").as_deref(), Some("xyz123"));
    assert_eq!(normalize_option_key("  Tooltip ").as_deref(), Some("tooltip"));
    assert_eq!(normalize_option_key("--"), None);
}

#[test]
fn parse_flags_and_options() {
    let spec = parse_placeholder("{{textbox:first_name|required|tooltip:Your first name|width:120}}").unwrap();
    assert_eq!(spec.kind, FieldKind::Text);
    assert_eq!(spec.name, "first_name");
    assert!(spec.required);
    assert!(!spec.readonly);
    assert_eq!(spec.option(&OptionKey::Tooltip), Some("Yourfirstname"));
    assert_eq!(spec.option(&OptionKey::Width), Some("120"));

    let spec = parse_placeholder("textbox:notes|required:false|readonly").unwrap();
    assert!(!spec.required);
    assert!(spec.readonly);

    let spec = parse_placeholder("readonlyfield:total").unwrap();
    assert_eq!(spec.kind, FieldKind::ReadonlyText);
    assert!(spec.readonly);
}

#[test]
fn mangled_option_keys_are_recovered() {
    let spec = parse_placeholder("radiobutton:size|Ivalue:Large|reqiured").unwrap();
    assert_eq!(spec.kind, FieldKind::Radio);
    assert_eq!(spec.option(&OptionKey::Value), Some("Large"));
    assert!(spec.required);
}

#[test]
fn unknown_keyword_becomes_text() {
    let spec = parse_placeholder("sliderfield:volume").unwrap();
    assert_eq!(spec.kind, FieldKind::Other("sliderfield".to_string()));
    assert_eq!(spec.category(), docxside_forms::field::WidgetCategory::Text);
}

#[test]
fn malformed_tokens() {
    for token in ["textbox", "textbox:", ":name", "{{}}", "textbox:|required"] {
        match parse_placeholder(token) {
            Err(FieldError::MalformedToken { raw }) => assert_eq!(raw, token),
            other => panic!("{token:?} parsed as {other:?}"),
        }
    }
}

#[test]
fn recognizes_glued_tokens() {
    let text = "Name:{{textbox:fullname|required}}Gender:{{radiobutton:gender|value:Male}}{{radiobutton:gender|value:Female}}";
    let tokens = recognize(text);
    let found: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(
        found,
        [
            "{{textbox:fullname|required}}",
            "{{radiobutton:gender|value:Male}}",
            "{{radiobutton:gender|value:Female}}",
        ]
    );
    let chars: Vec<char> = text.chars().collect();
    for token in &tokens {
        let slice: String = chars[token.start..token.end].iter().collect();
        assert_eq!(slice, token.text);
    }
}

#[test]
fn recognizes_split_braces_and_invisible_chars() {
    let text = "Sign:{ {signaturefield:sig\u{200B}ner} }";
    let tokens = recognize(text);
    assert_eq!(tokens.len(), 1);
    let spec = parse_placeholder(&tokens[0].text).unwrap();
    assert_eq!(spec.kind, FieldKind::Signature);
    assert_eq!(spec.name, "signer");
}

#[test]
fn anchor_glued_to_text_is_separated() {
    let tokens = recognize("Accept terms{{checkbox:terms}}and{{textbox:initials}}");
    let found: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(found, ["{{checkbox:terms}}", "{{textbox:initials}}"]);
}

#[test]
fn date_is_not_an_anchor() {
    assert!(recognize("Date: 2024-01-01").is_empty());
    assert_eq!(recognize("{{date:dob}}").len(), 0);
    assert_eq!(recognize("{{datefield:dob}}").len(), 1);
}

#[test]
fn flag_glued_to_following_label() {
    let spec = parse_placeholder("textbox:fullname|requiredGender:").unwrap();
    assert_eq!(spec.name, "fullname");
    assert!(spec.required);
    assert!(spec.options.is_empty());

    let spec = parse_placeholder("textbox:total|readonlyAmount").unwrap();
    assert!(spec.readonly);
    assert!(!spec.required);
}
