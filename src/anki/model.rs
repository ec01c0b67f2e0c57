//! The note type every learned item is stored as.

use super::types::{
    CardTemplate,
    ModelDefinition,
};

pub const FIELD_WORD: &str = "Word";
pub const FIELD_PICTURE: &str = "Picture";
pub const FIELD_EXTRA_INFO: &str = "Extra Info";
pub const FIELD_PRONUNCIATION: &str = "Pronunciation";

pub const MODEL_FIELDS: [&str; 4] = [FIELD_WORD, FIELD_PICTURE, FIELD_EXTRA_INFO, FIELD_PRONUNCIATION];

const MODEL_CSS: &str = r#"
.card {
  font-family: arial;
  font-size: 20px;
  text-align: center;
  color: black;
  background-color: white;
}

.card1 { background-color: #FFFFFF; }
.card2 { background-color: #FFFFFF; }"#;

const COMPREHENSION_FRONT: &str = r#"
{{Word}}<br>
{{Pronunciation}}
"#;

const COMPREHENSION_BACK: &str = r#"
{{Word}}<br>
{{Pronunciation}}
<hr id=answer>
{{Picture}} <br>
<span style="color:grey">{{Extra Info}}</span>
"#;

const PRODUCTION_FRONT: &str = r#"
{{Picture}}
{{Extra Info}} <br>
"#;

const PRODUCTION_BACK: &str = r#"
{{Picture}}
{{Extra Info}} <br>
<hr id=answer>
{{Word}}
<br>
{{Pronunciation}}
"#;

/// Word, picture and meaning with two cards: recognise the word, then produce it.
pub fn learned_word_model(model_name: &str) -> ModelDefinition {
    ModelDefinition {
        model_name: model_name.to_string(),
        in_order_fields: MODEL_FIELDS.to_vec(),
        css: MODEL_CSS,
        card_templates: vec![
            CardTemplate {
                name: "Comprehension Card",
                front: COMPREHENSION_FRONT,
                back: COMPREHENSION_BACK,
            },
            CardTemplate {
                name: "Production Card",
                front: PRODUCTION_FRONT,
                back: PRODUCTION_BACK,
            },
        ],
    }
}
