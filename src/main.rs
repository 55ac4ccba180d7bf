use std::env;
use std::process::ExitCode;

use vanillaformer::{DecodeMode, ModelConfig, TransformerModel, Translator, Vocabulary};

const DEFAULT_SENTENCE: &str = "I am happy .";

/// Parsed command line: `[config-path|-] [sentence] [--iterative] [--max-steps N]`.
struct Cli {
    config: Option<String>,
    sentence: String,
    mode: DecodeMode,
}

fn parse_cli<I>(mut args: I) -> Result<Cli, String>
where
    I: Iterator<Item = String>,
{
    let mut positional = Vec::new();
    let mut mode = DecodeMode::OneShot;
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--iterative" => mode = DecodeMode::Iterative { max_steps: 20 },
            "--max-steps" => {
                let value = args
                    .next()
                    .ok_or_else(|| "--max-steps needs a value".to_string())?;
                let n = value
                    .parse()
                    .map_err(|_| format!("--max-steps expects a number, got {value:?}"))?;
                mode = DecodeMode::Iterative { max_steps: n };
            }
            _ => positional.push(arg),
        }
    }
    let mut positional = positional.into_iter();
    let config = positional.next().filter(|p| p.as_str() != "-");
    let sentence = positional
        .next()
        .unwrap_or_else(|| DEFAULT_SENTENCE.to_string());
    Ok(Cli {
        config,
        sentence,
        mode,
    })
}

fn run(cli: &Cli) -> vanillaformer::Result<String> {
    let source = Vocabulary::english();
    let target = Vocabulary::french();
    let config = match &cli.config {
        Some(path) => ModelConfig::from_path(path)?,
        None => ModelConfig {
            vocab_size: target.len(),
            ..ModelConfig::default()
        },
    };
    let model = TransformerModel::new(config)?;
    Translator::new(model, source, target)
        .with_mode(cli.mode)
        .translate(&cli.sentence)
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = match parse_cli(env::args().skip(1)) {
        Ok(cli) => cli,
        Err(e) => {
            log::error!("invalid arguments: {e}");
            return ExitCode::FAILURE;
        }
    };
    match run(&cli) {
        Ok(translation) => {
            println!("Input Sentence: {}", cli.sentence);
            println!("Predicted Translation: {}", translation);
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("translation failed: {e}");
            ExitCode::FAILURE
        }
    }
}
