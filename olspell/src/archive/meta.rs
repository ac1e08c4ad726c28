//! Speller metadata, read from the `index.xml` of a speller archive.
//!
//! The metadata is purely descriptive: nothing in the search consumes it.
use serde::{Deserialize, Serialize};
use serde_xml_rs::{from_reader, Error, ParserConfig};

/// Metadata of one speller archive.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadata {
    /// speller info
    pub info: SpellerMetadataInfo,
    /// acceptor metadata
    pub acceptor: SpellerMetadataAcceptor,
    /// error model metadata
    pub errmodel: SpellerMetadataErrmodel,
}

/// A localised human-readable title.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerTitle {
    /// ISO 639 code of the title's language
    pub lang: Option<String>,
    /// the title text
    #[serde(rename = "$value")]
    pub value: String,
}

/// Descriptive information about the speller as a whole.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataInfo {
    /// ISO 639 code of the speller's language
    pub locale: String,
    /// localised titles of the speller
    pub title: Vec<SpellerTitle>,
    /// human-readable description
    pub description: String,
    /// creator of the speller
    pub producer: String,
}

/// Descriptive information about the acceptor automaton.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataAcceptor {
    /// acceptor type
    #[serde(rename = "type", default)]
    pub type_: String,
    /// archive-unique id of the acceptor
    pub id: String,
    /// localised titles
    pub title: Vec<SpellerTitle>,
    /// human-readable description
    pub description: String,
}

/// Descriptive information about the error model automaton.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct SpellerMetadataErrmodel {
    /// archive-unique id of the error model
    pub id: String,
    /// localised titles
    pub title: Vec<SpellerTitle>,
    /// human-readable description
    pub description: String,
}

impl std::str::FromStr for SpellerMetadata {
    type Err = Error;

    fn from_str(string: &str) -> Result<SpellerMetadata, Error> {
        SpellerMetadata::from_bytes(string.as_bytes())
    }
}

impl SpellerMetadata {
    /// Parses metadata from raw XML.
    pub fn from_bytes(bytes: &[u8]) -> Result<SpellerMetadata, Error> {
        let mut reader = ParserConfig::new()
            .trim_whitespace(true)
            .ignore_comments(true)
            .coalesce_characters(true)
            .create_reader(bytes)
            .into_inner();

        from_reader(&mut reader)
    }
}

#[test]
fn test_xml_parse() {
    use std::str::FromStr;

    let xml_data = r##"<?xml version="1.0" encoding="UTF-8"?>
        <hfstspeller dtdversion="1.0" hfstversion="3">
        <info>
            <locale>se</locale>
            <title>Giellatekno/Divvun/UiT fst-based speller for Northern Sami</title>
            <description>This is an fst-based speller for Northern Sami.</description>
            <version vcsrev="GT_REVISION">GT_VERSION</version>
            <date>DATE</date>
            <producer>Giellatekno/Divvun/UiT contributors</producer>
            <contact email="feedback@divvun.no" website="http://divvun.no"/>
        </info>
        <acceptor type="general" id="acceptor.default.hfst">
            <title>Giellatekno/Divvun/UiT dictionary Northern Sami</title>
            <description>Giellatekno/Divvun/UiT dictionary for
            Northern Sami compiled for HFST.</description>
        </acceptor>
        <errmodel id="errmodel.default.hfst">
            <title>Levenshtein edit distance transducer</title>
            <description>Correction model for keyboard misstrokes, at most 2 per
            word.</description>
            <type type="default"/>
            <model>errormodel.default.hfst</model>
        </errmodel>
        </hfstspeller>
    "##;

    let metadata = SpellerMetadata::from_str(xml_data).unwrap();
    assert_eq!(metadata.info.locale, "se");
    assert_eq!(metadata.acceptor.id, "acceptor.default.hfst");
    assert_eq!(metadata.errmodel.id, "errmodel.default.hfst");
}
