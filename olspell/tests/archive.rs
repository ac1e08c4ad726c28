mod common;

use std::io::{Cursor, Write};

use olspell::archive::{SpellerArchiveError, ZhfstArchive};

const INDEX_XML: &str = r##"<?xml version="1.0" encoding="UTF-8"?>
<hfstspeller dtdversion="1.0" hfstversion="3">
<info>
    <locale>xx</locale>
    <title>Test speller</title>
    <description>Fixture speller for cat and dog.</description>
    <producer>olspell tests</producer>
</info>
<acceptor type="general" id="acceptor.default.hfst">
    <title>Test dictionary</title>
    <description>Accepts cat and dog.</description>
</acceptor>
<errmodel id="errmodel.default.hfst">
    <title>Edit distance transducer</title>
    <description>At most two edits per word.</description>
</errmodel>
</hfstspeller>
"##;

fn zhfst(entries: &[(&str, Vec<u8>)]) -> Cursor<Vec<u8>> {
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Stored);
    let mut writer = zip::ZipWriter::new(Cursor::new(vec![]));

    for (name, data) in entries {
        writer.start_file(*name, options).unwrap();
        writer.write_all(data).unwrap();
    }

    writer.finish().unwrap()
}

fn default_archive() -> ZhfstArchive {
    let bundle = zhfst(&[
        ("acceptor.default.hfst", common::cat_dog_lexicon()),
        ("errmodel.default.hfst", common::edit_distance_2_errmodel()),
        ("index.xml", INDEX_XML.as_bytes().to_vec()),
    ]);
    ZhfstArchive::read(bundle).unwrap()
}

#[test]
fn spells_and_suggests_through_the_archive() {
    let mut archive = default_archive();

    assert!(archive.can_correct());
    assert!(archive.spell("cat"));
    assert!(!archive.spell("cot"));

    let suggestions = archive.suggest("cot");
    let values: Vec<&str> = suggestions.iter().map(|s| s.value()).collect();
    assert_eq!(values, vec!["cat", "dog"]);
}

#[test]
fn parses_metadata() {
    let archive = default_archive();
    let metadata = archive.metadata().unwrap();
    assert_eq!(metadata.info.locale, "xx");
    assert_eq!(metadata.acceptor.id, "acceptor.default.hfst");
    assert_eq!(metadata.errmodel.id, "errmodel.default.hfst");
}

#[test]
fn analyse_is_independent_of_ask_sugger() {
    let mut archive = default_archive();
    let plain = archive.analyse("cat", false);
    let suggers = archive.analyse("cat", true);
    assert_eq!(plain, suggers);
    assert_eq!(plain[0].value(), "cat");
}

#[test]
fn suggest_analyses_pairs_corrections_with_analyses() {
    let mut archive = default_archive();
    let analysed = archive.suggest_analyses("cot");

    assert_eq!(analysed.len(), 2);
    assert!(analysed
        .iter()
        .any(|a| a.value == "cat" && a.analysis == "cat"));
    assert!(analysed
        .iter()
        .any(|a| a.value == "dog" && a.analysis == "dog"));
}

#[test]
fn limits_propagate_to_the_speller() {
    let mut archive = default_archive();
    archive.set_queue_limit(1);
    assert_eq!(archive.suggest("cot").len(), 1);
    archive.set_queue_limit(0);
    archive.set_weight_limit(1.5);
    assert_eq!(archive.suggest("cot").len(), 1);
}

#[test]
fn acceptor_without_errmodel_cannot_correct() {
    let bundle = zhfst(&[("acceptor.xx.hfst", common::cat_dog_lexicon())]);
    let mut archive = ZhfstArchive::read(bundle).unwrap();

    assert!(!archive.can_correct());
    assert!(archive.spell("dog"));
    assert!(archive.suggest("dig").is_empty());
}

#[test]
fn non_default_pair_is_selected_by_name_order() {
    let bundle = zhfst(&[
        ("acceptor.foo.hfst", common::cat_dog_lexicon()),
        ("errmodel.bar.hfst", common::edit_distance_2_errmodel()),
    ]);
    let mut archive = ZhfstArchive::read(bundle).unwrap();

    assert!(archive.can_correct());
    assert_eq!(archive.suggest("cot")[0].value(), "cat");
}

#[test]
fn unselected_automata_are_kept_by_name() {
    let bundle = zhfst(&[
        ("acceptor.default.hfst", common::cat_dog_lexicon()),
        ("acceptor.extra.hfst", common::cat_dog_lexicon()),
        ("errmodel.default.hfst", common::edit_distance_2_errmodel()),
    ]);
    let archive = ZhfstArchive::read(bundle).unwrap();

    let spares: Vec<&str> = archive.spare_acceptors().collect();
    assert_eq!(spares, vec!["extra"]);
    assert_eq!(archive.spare_errmodels().count(), 0);
}

#[test]
fn wrapped_automata_load_from_archives() {
    let bundle = zhfst(&[(
        "acceptor.default.hfst",
        common::wrap_hfst3(&common::cat_dog_lexicon()),
    )]);
    let mut archive = ZhfstArchive::read(bundle).unwrap();
    assert!(archive.spell("cat"));
}

#[test]
fn archive_without_automata_is_rejected() {
    let bundle = zhfst(&[("index.xml", INDEX_XML.as_bytes().to_vec())]);
    assert!(matches!(
        ZhfstArchive::read(bundle),
        Err(SpellerArchiveError::NoAutomata)
    ));
}
