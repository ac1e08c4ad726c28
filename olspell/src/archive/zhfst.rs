use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use zip::ZipArchive;

use super::error::SpellerArchiveError;
use super::meta::SpellerMetadata;
use crate::speller::suggestion::{AnalyzedSuggestion, Suggestion, SymbolsAnalysis};
use crate::speller::Speller;
use crate::transducer::Transducer;
use crate::types::Weight;

const ACCEPTOR_PREFIX: &str = "acceptor.";
const ERRMODEL_PREFIX: &str = "errmodel.";
const METADATA_NAME: &str = "index.xml";

/// A speller read from a ZHFST archive: a ZIP bundle of acceptor and error
/// model automata plus an `index.xml` metadata blob.
///
/// The automata are keyed by the name between the entry prefix and its
/// extension. The speller pair is selected once at load: the pair named
/// `default` when present, otherwise the first of each; with no error model
/// at all the acceptor runs alone and corrections are unavailable.
pub struct ZhfstArchive {
    metadata: Option<SpellerMetadata>,
    speller: Speller,
    acceptors: BTreeMap<String, Transducer>,
    errmodels: BTreeMap<String, Transducer>,
}

/// The name between an entry's prefix and its first following dot.
fn entry_stem(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    let stem = rest.split('.').next().unwrap_or(rest);
    Some(stem.to_owned())
}

impl ZhfstArchive {
    /// Opens an archive from a file path.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<ZhfstArchive, SpellerArchiveError> {
        let file = File::open(path.as_ref()).map_err(SpellerArchiveError::File)?;
        ZhfstArchive::read(BufReader::new(file))
    }

    /// Reads an archive from any seekable byte source.
    pub fn read<R: Read + Seek>(reader: R) -> Result<ZhfstArchive, SpellerArchiveError> {
        let mut archive = ZipArchive::new(reader).map_err(SpellerArchiveError::Zip)?;

        let mut acceptors: BTreeMap<String, Transducer> = BTreeMap::new();
        let mut errmodels: BTreeMap<String, Transducer> = BTreeMap::new();
        let mut metadata = None;

        for index in 0..archive.len() {
            let mut entry = archive
                .by_index(index)
                .map_err(SpellerArchiveError::Zip)?;
            let name = entry.name().to_owned();

            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .map_err(|e| SpellerArchiveError::Io(name.clone(), e))?;

            if let Some(stem) = entry_stem(&name, ACCEPTOR_PREFIX) {
                let transducer = Transducer::load(&buf)
                    .map_err(|e| SpellerArchiveError::Transducer(name.clone(), e))?;
                acceptors.insert(stem, transducer);
            } else if let Some(stem) = entry_stem(&name, ERRMODEL_PREFIX) {
                let transducer = Transducer::load(&buf)
                    .map_err(|e| SpellerArchiveError::Transducer(name.clone(), e))?;
                errmodels.insert(stem, transducer);
            } else if name == METADATA_NAME {
                metadata = SpellerMetadata::from_bytes(&buf).ok();
            } else {
                log::warn!("unknown file in archive: {}", name);
            }
        }

        let (acceptor, errmodel) = select_pair(&mut acceptors, &mut errmodels)?;
        let speller = Speller::new(errmodel, acceptor);

        Ok(ZhfstArchive {
            metadata,
            speller,
            acceptors,
            errmodels,
        })
    }

    /// The metadata parsed from `index.xml`, if the archive carried any.
    pub fn metadata(&self) -> Option<&SpellerMetadata> {
        self.metadata.as_ref()
    }

    /// The selected speller.
    pub fn speller(&self) -> &Speller {
        &self.speller
    }

    /// The selected speller, for searching.
    pub fn speller_mut(&mut self) -> &mut Speller {
        &mut self.speller
    }

    /// Whether the archive carried an error model for the selected pair.
    pub fn can_correct(&self) -> bool {
        self.speller.can_correct()
    }

    /// Names of the acceptors that were loaded but not selected.
    pub fn spare_acceptors(&self) -> impl Iterator<Item = &str> {
        self.acceptors.keys().map(|k| k.as_str())
    }

    /// Names of the error models that were loaded but not selected.
    pub fn spare_errmodels(&self) -> impl Iterator<Item = &str> {
        self.errmodels.keys().map(|k| k.as_str())
    }

    /// Caps the number of results of `suggest` and the analyses.
    pub fn set_queue_limit(&mut self, limit: usize) {
        self.speller.set_queue_limit(limit);
    }

    /// Caps the weight of any returned result.
    pub fn set_weight_limit(&mut self, limit: Weight) {
        self.speller.set_weight_limit(limit);
    }

    /// Caps the weight gap above the best result.
    pub fn set_beam(&mut self, beam: Weight) {
        self.speller.set_beam(beam);
    }

    /// Caps the wall-clock time of one correction call, in seconds.
    pub fn set_time_cutoff(&mut self, seconds: f32) {
        self.speller.set_time_cutoff(seconds);
    }

    /// Whether `word` is spelled correctly.
    pub fn spell(&mut self, word: &str) -> bool {
        self.speller.check(word)
    }

    /// Ranked corrections for `word`, ascending by weight.
    pub fn suggest(&mut self, word: &str) -> Vec<Suggestion> {
        self.speller.suggest(word)
    }

    /// Morphological analyses of `word`.
    ///
    /// `ask_sugger` selects the correction model's speller, which is the
    /// same unit here; the flag is kept for interface parity with spellers
    /// where the two differ.
    pub fn analyse(&mut self, word: &str, _ask_sugger: bool) -> Vec<Suggestion> {
        self.speller.analyse(word)
    }

    /// Like [`analyse`](Self::analyse) with the output symbols of each
    /// analysis kept separate.
    pub fn analyse_symbols(&mut self, word: &str, _ask_sugger: bool) -> Vec<SymbolsAnalysis> {
        self.speller.analyse_symbols(word)
    }

    /// Corrections for `word` paired with their analyses, ascending by
    /// analysis weight.
    pub fn suggest_analyses(&mut self, word: &str) -> Vec<AnalyzedSuggestion> {
        let suggestions = self.suggest(word);
        let mut out = vec![];

        for suggestion in suggestions {
            for analysis in self.analyse(suggestion.value(), true) {
                out.push(AnalyzedSuggestion {
                    value: suggestion.value.clone(),
                    analysis: analysis.value,
                    weight: analysis.weight,
                });
            }
        }

        out.sort();
        out
    }
}

/// Moves the selected acceptor/errmodel pair out of the collections.
fn select_pair(
    acceptors: &mut BTreeMap<String, Transducer>,
    errmodels: &mut BTreeMap<String, Transducer>,
) -> Result<(Transducer, Option<Transducer>), SpellerArchiveError> {
    if acceptors.contains_key("default") && errmodels.contains_key("default") {
        let acceptor = acceptors.remove("default").unwrap();
        let errmodel = errmodels.remove("default").unwrap();
        return Ok((acceptor, Some(errmodel)));
    }

    if !acceptors.is_empty() && !errmodels.is_empty() {
        let acceptor_name = acceptors.keys().next().unwrap().clone();
        let errmodel_name = errmodels.keys().next().unwrap().clone();
        log::warn!(
            "no default speller, using {} with {}",
            acceptor_name,
            errmodel_name
        );
        let acceptor = acceptors.remove(&acceptor_name).unwrap();
        let errmodel = errmodels.remove(&errmodel_name).unwrap();
        return Ok((acceptor, Some(errmodel)));
    }

    if let Some(acceptor) = acceptors.remove("default") {
        return Ok((acceptor, None));
    }

    if let Some(first) = acceptors.keys().next().cloned() {
        let acceptor = acceptors.remove(&first).unwrap();
        return Ok((acceptor, None));
    }

    Err(SpellerArchiveError::NoAutomata)
}
