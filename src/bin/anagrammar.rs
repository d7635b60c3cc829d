//! anagrammar CLI - grammar-constrained anagram search
//!
//! Loads a grammar and the word lists it names, then prints every phrase the
//! grammar accepts that uses exactly the letters of the input.

use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use clap::Parser;

use anagrammar::grammar::{self, normalize_line};
use anagrammar::{trace, Engine, EngineConfig, Error, SearchOptions, WordLists};

#[derive(Parser)]
#[command(
    name = "anagrammar",
    about = "Find anagrams of a phrase that a grammar accepts"
)]
struct Cli {
    /// Grammar file, one rule per line
    #[arg(short, long)]
    grammar: PathBuf,
    /// Word list for a grammar terminal, as NAME=FILE (repeatable)
    #[arg(short, long = "list", value_parser = parse_list)]
    lists: Vec<(String, PathBuf)>,
    /// Stop after this many results
    #[arg(long)]
    sample: Option<usize>,
    /// Explore in random order
    #[arg(long)]
    random: bool,
    /// Print each distinct phrase once
    #[arg(long)]
    unique: bool,
    /// Print only the number of phrases found
    #[arg(long)]
    count: bool,
    /// Number of worker threads (default: available cores)
    #[arg(short = 'j', long)]
    threads: Option<usize>,
    /// Print the compiled automaton as Graphviz and exit
    #[arg(long)]
    dot: bool,
    /// Print the normalized grammar and exit
    #[arg(long)]
    show_grammar: bool,
    /// Write anagrams, grammar or Graphviz output to this file instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,
    /// Phrase to rearrange
    #[arg(required_unless_present_any = ["dot", "show_grammar"])]
    words: Vec<String>,
}

fn parse_list(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((name, path)) if !name.is_empty() && !path.is_empty() => {
            Ok((name.to_string(), PathBuf::from(path)))
        }
        _ => Err(format!("expected NAME=FILE, got '{}'", arg)),
    }
}

fn read_lines(path: &Path) -> Result<Vec<String>, Error> {
    let text = fs::read_to_string(path).map_err(|e| {
        Error::Io(io::Error::new(
            e.kind(),
            format!("{}: {}", path.display(), e),
        ))
    })?;
    Ok(text.lines().map(str::to_string).collect())
}

fn read_words(path: &Path) -> Result<Vec<String>, Error> {
    Ok(read_lines(path)?
        .into_iter()
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect())
}

fn open_output(path: Option<&Path>) -> Result<Box<dyn Write + Send>, Error> {
    match path {
        Some(path) => {
            let file = File::create(path).map_err(|e| {
                Error::Io(io::Error::new(
                    e.kind(),
                    format!("{}: {}", path.display(), e),
                ))
            })?;
            Ok(Box::new(BufWriter::new(file)))
        }
        None => Ok(Box::new(io::stdout())),
    }
}

fn run(cli: Cli) -> Result<(), Error> {
    let lines = read_lines(&cli.grammar)?;
    let mut out = open_output(cli.out.as_deref())?;

    if cli.show_grammar {
        for line in lines.iter().map(|l| normalize_line(l)).filter(|l| !l.is_empty()) {
            writeln!(out, "{}", line)?;
        }
        out.flush()?;
        return Ok(());
    }

    let automaton = grammar::compile(&lines)?;
    if cli.dot {
        write!(out, "{}", automaton.graphviz_dot("grammar"))?;
        out.flush()?;
        return Ok(());
    }

    let mut word_lists = WordLists::new();
    for name in automaton.required_lists() {
        if let Some((_, path)) = cli.lists.iter().rev().find(|(n, _)| *n == name) {
            word_lists.insert(name, read_words(path)?);
        }
    }

    let mut config = EngineConfig::default();
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }
    let mut engine = Engine::with_config(automaton, &word_lists, config)?;

    let mut options = SearchOptions::new();
    if let Some(n) = cli.sample {
        options = options.sample(n);
    }
    if cli.random {
        options = options.random();
    }

    let input = cli.words.join(" ");
    let mut seen: HashSet<String> = HashSet::new();
    let mut printed = 0usize;
    let mut failure: Option<io::Error> = None;
    engine.run(&input, options, |done| {
        for phrase in done.phrases() {
            let line = phrase.join(" ");
            if cli.unique && !seen.insert(line.clone()) {
                continue;
            }
            printed += 1;
            if cli.count || failure.is_some() {
                continue;
            }
            if let Err(e) = writeln!(out, "{}", line) {
                failure = Some(e);
            }
        }
    })?;
    if let Some(e) = failure {
        return Err(e.into());
    }
    if cli.count {
        writeln!(out, "{}", printed)?;
    }
    out.flush()?;
    Ok(())
}

fn main() {
    trace::init_subscriber();
    let cli = Cli::parse();
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "anagrammar-cli-{}-{}",
            name,
            std::process::id()
        ));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn setup(dir: &Path) -> (PathBuf, PathBuf) {
        let grammar = dir.join("grammar.txt");
        let words = dir.join("words.txt");
        fs::write(&grammar, "TOP -> <w>+\n").unwrap();
        fs::write(&words, "ab\nba\nc\n\n").unwrap();
        (grammar, words)
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("anagrammar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn anagrams_go_to_the_out_file() {
        let dir = scratch("out");
        let (grammar, words) = setup(&dir);
        let out = dir.join("found.txt");
        run(cli(&[
            "-g",
            grammar.to_str().unwrap(),
            "-l",
            &format!("w={}", words.display()),
            "-o",
            out.to_str().unwrap(),
            "-j",
            "1",
            "abc",
        ]))
        .unwrap();

        let mut found: Vec<String> = fs::read_to_string(&out)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect();
        found.sort();
        assert_eq!(found, vec!["ab c", "ba c", "c ab", "c ba"]);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn count_and_grammar_dumps_honor_out() {
        let dir = scratch("dumps");
        let (grammar, words) = setup(&dir);
        let list = format!("w={}", words.display());

        let count = dir.join("count.txt");
        run(cli(&[
            "-g",
            grammar.to_str().unwrap(),
            "-l",
            &list,
            "--count",
            "-o",
            count.to_str().unwrap(),
            "abc",
        ]))
        .unwrap();
        assert_eq!(fs::read_to_string(&count).unwrap(), "4\n");

        let shown = dir.join("grammar.out");
        run(cli(&[
            "-g",
            grammar.to_str().unwrap(),
            "--show-grammar",
            "-o",
            shown.to_str().unwrap(),
        ]))
        .unwrap();
        assert_eq!(fs::read_to_string(&shown).unwrap(), "TOP-><w>+\n");

        let dot = dir.join("grammar.dot");
        run(cli(&["-g", grammar.to_str().unwrap(), "--dot", "-o", dot.to_str().unwrap()]))
            .unwrap();
        assert!(fs::read_to_string(&dot).unwrap().starts_with("digraph grammar {"));
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn unwritable_out_path_is_an_error() {
        let dir = scratch("missing");
        let (grammar, _) = setup(&dir);
        let out = dir.join("no-such-dir").join("found.txt");
        let err = run(cli(&[
            "-g",
            grammar.to_str().unwrap(),
            "--show-grammar",
            "-o",
            out.to_str().unwrap(),
        ]))
        .unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        fs::remove_dir_all(&dir).unwrap();
    }
}
