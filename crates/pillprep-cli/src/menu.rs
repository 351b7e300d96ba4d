use anyhow::{Context, Result};
use pillprep_pipeline::Pipeline;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

const QUICK: [&str; 4] = ["prototype", "development", "experiment", "demo"];

pub fn run(pipeline: &Pipeline) -> Result<()> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        println!();
        println!("pillprep");
        for (i, name) in QUICK.iter().enumerate() {
            println!("  {}) complete pipeline: {name}", i + 1);
        }
        println!("  5) custom pipeline");
        println!("  6) create dataset only");
        println!("  7) process existing dataset");
        println!("  8) list presets");
        println!("  q) quit");

        let Some(choice) = prompt(&mut input, "choice")? else {
            return Ok(());
        };
        let outcome = match choice.as_str() {
            "1" | "2" | "3" | "4" => {
                let idx: usize = choice.parse().context("menu choice")?;
                crate::complete(pipeline, QUICK[idx - 1])
            }
            "5" => custom(pipeline, &mut input),
            "6" => match prompt(&mut input, "preset")? {
                Some(preset) => crate::create(pipeline, &preset),
                None => return Ok(()),
            },
            "7" => match prompt(&mut input, "dataset path")? {
                Some(path) => crate::process(pipeline, &PathBuf::from(path)),
                None => return Ok(()),
            },
            "8" => {
                crate::list(pipeline.presets());
                Ok(())
            }
            "q" | "quit" | "exit" => return Ok(()),
            other => {
                println!("unknown choice {other:?}");
                Ok(())
            }
        };
        // A failed run returns to the menu.
        if let Err(err) = outcome {
            println!("error: {err:#}");
        }
    }
}

fn custom(pipeline: &Pipeline, input: &mut impl BufRead) -> Result<()> {
    let Some(train) = prompt(input, "train images")? else {
        return Ok(());
    };
    let Some(test) = prompt(input, "test images")? else {
        return Ok(());
    };
    let train: usize = train.parse().with_context(|| format!("invalid train size {train:?}"))?;
    let test: usize = test.parse().with_context(|| format!("invalid test size {test:?}"))?;
    let name = prompt(input, "name [custom]")?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "custom".to_string());
    let strategy = prompt(input, "strategy (random/balanced/quality) [balanced]")?
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "balanced".to_string());
    crate::custom(pipeline, train, test, &name, &strategy)
}

/// `None` on end of input.
fn prompt(input: &mut impl BufRead, label: &str) -> Result<Option<String>> {
    print!("{label}: ");
    io::stdout().flush().context("flush stdout")?;
    let mut line = String::new();
    if input.read_line(&mut line).context("read stdin")? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}
