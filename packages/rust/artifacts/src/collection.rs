//! JSON blobs stored in the `col` row: collection config, note types,
//! decks and deck options.

use serde_json::{Value, json};

use crate::ids::TimeBase;

/// Id of the built-in "Default" deck and its option group.
const DEFAULT_DECK_ID: i64 = 1;

const CARD_CSS: &str = ".card {\n font-family: arial;\n font-size: 20px;\n text-align: center;\n color: black;\n background-color: white;\n}\n";

const LATEX_PRE: &str = "\\documentclass[12pt]{article}\n\\special{papersize=3in,5in}\n\\usepackage[utf8]{inputenc}\n\\usepackage{amssymb,amsmath}\n\\pagestyle{empty}\n\\setlength{\\parindent}{0in}\n\\begin{document}\n";

const LATEX_POST: &str = "\\end{document}";

/// Front template.
pub const QUESTION_FORMAT: &str = "{{Term}}";

/// Back template.
pub const ANSWER_FORMAT: &str = "{{FrontSide}}<hr id=\"answer\">{{Definition}}";

/// Names and ids of the deck and note type a package declares.
#[derive(Debug, Clone)]
pub(crate) struct CollectionLayout<'a> {
    pub deck_id: i64,
    pub deck_name: &'a str,
    pub note_type_id: i64,
    pub note_type_name: &'a str,
}

/// Serialized `conf`, `models`, `decks` and `dconf` columns.
#[derive(Debug, Clone)]
pub(crate) struct CollectionJson {
    pub conf: String,
    pub models: String,
    pub decks: String,
    pub dconf: String,
}

impl CollectionJson {
    pub fn build(layout: &CollectionLayout<'_>, time_base: TimeBase) -> Self {
        Self {
            conf: conf_json(layout).to_string(),
            models: models_json(layout, time_base).to_string(),
            decks: decks_json(layout, time_base).to_string(),
            dconf: dconf_json().to_string(),
        }
    }
}

fn conf_json(layout: &CollectionLayout<'_>) -> Value {
    json!({
        "activeDecks": [DEFAULT_DECK_ID],
        "addToCur": true,
        "collapseTime": 1200,
        "curDeck": DEFAULT_DECK_ID,
        "curModel": layout.note_type_id.to_string(),
        "dueCounts": true,
        "estTimes": true,
        "newBury": true,
        "newSpread": 0,
        "nextPos": 1,
        "sortBackwards": false,
        "sortType": "noteFld",
        "timeLim": 0,
    })
}

fn field(name: &str, ord: u32) -> Value {
    json!({
        "name": name,
        "ord": ord,
        "font": "Arial",
        "media": [],
        "rtl": false,
        "size": 20,
        "sticky": false,
    })
}

fn models_json(layout: &CollectionLayout<'_>, time_base: TimeBase) -> Value {
    let model = json!({
        "id": layout.note_type_id,
        "name": layout.note_type_name,
        "type": 0,
        "mod": time_base.secs(),
        "usn": -1,
        "sortf": 0,
        "did": layout.deck_id,
        "tmpls": [{
            "name": "Card 1",
            "ord": 0,
            "qfmt": QUESTION_FORMAT,
            "afmt": ANSWER_FORMAT,
            "bqfmt": "",
            "bafmt": "",
            "did": Value::Null,
        }],
        "flds": [field("Term", 0), field("Definition", 1)],
        "css": CARD_CSS,
        "latexPre": LATEX_PRE,
        "latexPost": LATEX_POST,
        "latexsvg": false,
        "req": [[0, "all", [0]]],
        "tags": [],
        "vers": [],
    });

    let mut models = serde_json::Map::new();
    models.insert(layout.note_type_id.to_string(), model);
    Value::Object(models)
}

fn deck(id: i64, name: &str, modified: i64, usn: i64) -> Value {
    json!({
        "id": id,
        "name": name,
        "desc": "",
        "mod": modified,
        "usn": usn,
        "collapsed": false,
        "conf": 1,
        "dyn": 0,
        "extendNew": 10,
        "extendRev": 50,
        "lrnToday": [0, 0],
        "newToday": [0, 0],
        "revToday": [0, 0],
        "timeToday": [0, 0],
    })
}

fn decks_json(layout: &CollectionLayout<'_>, time_base: TimeBase) -> Value {
    let mut decks = serde_json::Map::new();
    decks.insert(
        DEFAULT_DECK_ID.to_string(),
        deck(DEFAULT_DECK_ID, "Default", time_base.secs(), 0),
    );
    decks.insert(
        layout.deck_id.to_string(),
        deck(layout.deck_id, layout.deck_name, time_base.secs(), -1),
    );
    Value::Object(decks)
}

fn dconf_json() -> Value {
    json!({
        "1": {
            "id": 1,
            "name": "Default",
            "mod": 0,
            "usn": 0,
            "maxTaken": 60,
            "autoplay": true,
            "timer": 0,
            "replayq": true,
            "new": {
                "bury": true,
                "delays": [1, 10],
                "initialFactor": 2500,
                "ints": [1, 4, 7],
                "order": 1,
                "perDay": 20,
                "separate": true,
            },
            "lapse": {
                "delays": [10],
                "leechAction": 0,
                "leechFails": 8,
                "minInt": 1,
                "mult": 0,
            },
            "rev": {
                "bury": true,
                "ease4": 1.3,
                "fuzz": 0.05,
                "ivlFct": 1,
                "maxIvl": 36500,
                "minSpace": 1,
                "perDay": 100,
            },
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> CollectionLayout<'static> {
        CollectionLayout {
            deck_id: 2_059_400_110,
            deck_name: "Startup Terms",
            note_type_id: 1_607_392_319,
            note_type_name: "Startup Terms Model",
        }
    }

    #[test]
    fn models_keyed_by_note_type_id() {
        let json = CollectionJson::build(&layout(), TimeBase::from_millis(1_700_000_000_000));
        let models: Value = serde_json::from_str(&json.models).unwrap();
        let model = &models["1607392319"];
        assert_eq!(model["name"], "Startup Terms Model");
        assert_eq!(model["did"], 2_059_400_110_i64);
        assert_eq!(model["flds"][0]["name"], "Term");
        assert_eq!(model["flds"][1]["name"], "Definition");
        assert_eq!(model["tmpls"][0]["qfmt"], QUESTION_FORMAT);
        assert_eq!(model["mod"], 1_700_000_000_i64);
    }

    #[test]
    fn decks_include_default_and_package_deck() {
        let json = CollectionJson::build(&layout(), TimeBase::from_millis(1_700_000_000_000));
        let decks: Value = serde_json::from_str(&json.decks).unwrap();
        assert_eq!(decks["1"]["name"], "Default");
        assert_eq!(decks["2059400110"]["name"], "Startup Terms");
        assert_eq!(decks["2059400110"]["id"], 2_059_400_110_i64);
    }

    #[test]
    fn conf_points_at_note_type() {
        let json = CollectionJson::build(&layout(), TimeBase::from_millis(0));
        let conf: Value = serde_json::from_str(&json.conf).unwrap();
        assert_eq!(conf["curModel"], "1607392319");
        let dconf: Value = serde_json::from_str(&json.dconf).unwrap();
        assert_eq!(dconf["1"]["new"]["perDay"], 20);
    }
}
