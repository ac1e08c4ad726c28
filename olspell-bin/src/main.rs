use std::io::{self, Read};
use std::path::PathBuf;

use gumdrop::Options;
use serde::Serialize;

use olspell::archive::ZhfstArchive;
use olspell::speller::suggestion::Suggestion;

trait OutputWriter {
    fn write_correction(&mut self, word: &str, is_correct: bool);
    fn write_suggestions(&mut self, word: &str, suggestions: &[Suggestion]);
    fn write_analyses(&mut self, word: &str, analyses: &[Suggestion]);
    fn finish(&mut self);
}

struct StdoutWriter;

impl OutputWriter for StdoutWriter {
    fn write_correction(&mut self, word: &str, is_correct: bool) {
        println!(
            "Input: {}\t\t[{}]",
            &word,
            if is_correct { "CORRECT" } else { "INCORRECT" }
        );
    }

    fn write_suggestions(&mut self, _word: &str, suggestions: &[Suggestion]) {
        for sugg in suggestions {
            println!("{}\t\t{}", sugg.value(), sugg.weight());
        }
        println!();
    }

    fn write_analyses(&mut self, word: &str, analyses: &[Suggestion]) {
        for analysis in analyses {
            println!("{}\t{}\t\t{}", word, analysis.value(), analysis.weight());
        }
        println!();
    }

    fn finish(&mut self) {}
}

#[derive(Serialize)]
struct SuggestionRequest {
    word: String,
    is_correct: bool,
    suggestions: Vec<Suggestion>,
}

#[derive(Serialize)]
struct AnalysisRequest {
    word: String,
    analyses: Vec<Suggestion>,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct JsonWriter {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    suggest: Vec<SuggestionRequest>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    analyse: Vec<AnalysisRequest>,
}

impl OutputWriter for JsonWriter {
    fn write_correction(&mut self, word: &str, is_correct: bool) {
        self.suggest.push(SuggestionRequest {
            word: word.to_owned(),
            is_correct,
            suggestions: vec![],
        });
    }

    fn write_suggestions(&mut self, _word: &str, suggestions: &[Suggestion]) {
        let i = self.suggest.len() - 1;
        self.suggest[i].suggestions = suggestions.to_vec();
    }

    fn write_analyses(&mut self, word: &str, analyses: &[Suggestion]) {
        self.analyse.push(AnalysisRequest {
            word: word.to_owned(),
            analyses: analyses.to_vec(),
        });
    }

    fn finish(&mut self) {
        println!("{}", serde_json::to_string_pretty(self).unwrap());
    }
}

#[derive(Debug, Options)]
struct Args {
    #[options(help = "print help message")]
    help: bool,

    #[options(command)]
    command: Option<Command>,
}

#[derive(Debug, Options)]
enum Command {
    #[options(help = "check words and suggest corrections")]
    Suggest(SuggestArgs),

    #[options(help = "analyse word forms against the lexicon")]
    Analyse(AnalyseArgs),
}

#[derive(Debug, Options)]
struct SuggestArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "ZHFST archive to be used", required)]
    archive: PathBuf,

    #[options(short = "S", help = "always show suggestions even if word is correct")]
    always_suggest: bool,

    #[options(help = "maximum weight limit for suggestions")]
    weight: Option<f32>,

    #[options(help = "maximum number of results")]
    nbest: Option<usize>,

    #[options(no_short, help = "weight distance from the best suggestion")]
    beam: Option<f32>,

    #[options(no_short, long = "time-cutoff", help = "search time limit in seconds")]
    time_cutoff: Option<f32>,

    #[options(no_short, long = "json", help = "output in JSON format")]
    use_json: bool,

    #[options(free, help = "words to be processed")]
    inputs: Vec<String>,
}

#[derive(Debug, Options)]
struct AnalyseArgs {
    #[options(help = "print help message")]
    help: bool,

    #[options(help = "ZHFST archive to be used", required)]
    archive: PathBuf,

    #[options(no_short, long = "json", help = "output in JSON format")]
    use_json: bool,

    #[options(free, help = "words to be processed")]
    inputs: Vec<String>,
}

fn collect_words(inputs: Vec<String>) -> Vec<String> {
    if inputs.is_empty() {
        eprintln!("Reading from stdin...");
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .expect("reading stdin");
        buffer.split_whitespace().map(|x| x.to_owned()).collect()
    } else {
        inputs
    }
}

fn suggest(args: SuggestArgs) -> anyhow::Result<()> {
    let mut archive = ZhfstArchive::open(&args.archive)?;

    if let Some(weight) = args.weight {
        archive.set_weight_limit(weight);
    }
    if let Some(nbest) = args.nbest {
        archive.set_queue_limit(nbest);
    }
    if let Some(beam) = args.beam {
        archive.set_beam(beam);
    }
    if let Some(time_cutoff) = args.time_cutoff {
        archive.set_time_cutoff(time_cutoff);
    }

    let mut writer: Box<dyn OutputWriter> = if args.use_json {
        Box::new(JsonWriter::default())
    } else {
        Box::new(StdoutWriter)
    };

    for word in collect_words(args.inputs) {
        let is_correct = archive.spell(&word);
        writer.write_correction(&word, is_correct);

        if args.always_suggest || !is_correct {
            let suggestions = archive.suggest(&word);
            writer.write_suggestions(&word, &suggestions);
        }
    }

    writer.finish();
    Ok(())
}

fn analyse(args: AnalyseArgs) -> anyhow::Result<()> {
    let mut archive = ZhfstArchive::open(&args.archive)?;

    let mut writer: Box<dyn OutputWriter> = if args.use_json {
        Box::new(JsonWriter::default())
    } else {
        Box::new(StdoutWriter)
    };

    for word in collect_words(args.inputs) {
        let analyses = archive.analyse(&word, false);
        writer.write_analyses(&word, &analyses);
    }

    writer.finish();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let args = Args::parse_args_default_or_exit();

    match args.command {
        None => Ok(()),
        Some(Command::Suggest(args)) => suggest(args),
        Some(Command::Analyse(args)) => analyse(args),
    }
}
