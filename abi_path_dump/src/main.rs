use std::{
    fs,
    io::{BufRead, BufReader},
    process,
};

use abi_data_access::{DataPathCache, SigningPath};
use abi_data_type::AbiTypeRef;
use abi_layout::AbiLayout;
use call_data::decode_call_data;
use clap::{App, Arg, ArgGroup, ArgMatches};

mod call_data;
mod logging;

type Error = Box<dyn std::error::Error>;
type Result<T> = std::result::Result<T, Error>;

pub fn main() {
    let matches = App::new("abi_path_dump")
        .about("Compiles signing paths for a contract function and applies them to call data")
        .after_help(
            "
Paths select a function argument or part of one, e.g. order.items.[-1].data.[0:4]
Without --input only the compiled paths are printed.
"
            .trim(),
        )
        // Interface options
        .arg(
            Arg::with_name("abi")
                .long("abi")
                .value_name("FILE")
                .help("path to the JSON interface description")
                .required(true),
        )
        .arg(
            Arg::with_name("function")
                .long("function")
                .value_name("NAME")
                .help("name of the function whose arguments the paths select")
                .required(true),
        )
        .arg(
            Arg::with_name("show-types")
                .long("show-types")
                .help("print the argument type tree of the function"),
        )
        .arg(
            Arg::with_name("json")
                .long("json")
                .help("print the type tree as JSON (only for --show-types)")
                .requires("show-types"),
        )
        // Call data options
        .arg(
            Arg::with_name("input")
                .long("input")
                .value_name("FILE")
                .help("path to a file containing hex call data (0x prefix means a selector is present)"),
        )
        .arg(
            Arg::with_name("no-selector")
                .long("no-selector")
                .help("keep the first 4 bytes of 0x-prefixed call data")
                .requires("input"),
        )
        // Path options
        .arg(
            Arg::with_name("paths")
                .long("paths")
                .alias("path")
                .value_name("PATHS")
                .help("path expressions to compile")
                .min_values(1),
        )
        .arg(
            Arg::with_name("path_file")
                .long("path_file")
                .alias("paths_file")
                .value_name("FILE")
                .help("path to file containing one path expression per line"),
        )
        .group(
            ArgGroup::with_name("path-options")
                .args(&["paths", "path_file"])
                .required(true)
                .multiple(true),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .multiple(true)
                .help("log compilation (-v) and interpretation (-vv) steps to stderr"),
        )
        .get_matches();

    logging::init(matches.occurrences_of("verbose"));

    run(&matches).unwrap_or_else(|error| {
        eprintln!("Error: {}", error);
        process::exit(1);
    });
}

fn run(matches: &ArgMatches<'_>) -> Result<()> {
    let abi_path = matches.value_of("abi").ok_or("missing --abi")?;
    let function = matches.value_of("function").ok_or("missing --function")?;

    let layout = AbiLayout::load(abi_path)?;
    let root = lookup_function(&layout, function)?;

    if matches.is_present("show-types") {
        print!("{}", format_types(root, matches.is_present("json"))?);
    }

    let call_data = match matches.value_of("input") {
        Some(input_path) => {
            let text = fs::read_to_string(input_path)?;
            let bytes = decode_call_data(&text, matches.is_present("no-selector"))?;
            tracing::debug!("read {} bytes of call data from {}", bytes.len(), input_path);
            Some(bytes)
        }
        None => None,
    };

    let cache = DataPathCache::new();
    let mut failures = 0;
    for source in get_paths(matches)? {
        let path = match cache.path(&layout, function, &source) {
            Ok(path) => path,
            Err(error) => {
                println!("{}\n  error: {}", source, indent(&error.to_string()));
                failures += 1;
                continue;
            }
        };
        print_path(&path);

        if let Some(call_data) = &call_data {
            match path.apply(call_data) {
                Ok(value) => println!("  value: {}", value),
                Err(error) => {
                    println!("  error: {}", indent(&error.to_string()));
                    failures += 1;
                }
            }
        }
    }

    if failures > 0 {
        return Err(format!("{} path(s) failed", failures).into());
    }
    Ok(())
}

fn get_paths(matches: &ArgMatches<'_>) -> Result<Vec<String>> {
    let mut paths = Vec::new();
    if let Some(sources) = matches.values_of("paths") {
        for source in sources {
            paths.push(source.to_string());
        }
    }
    if let Some(path_file) = matches.value_of("path_file") {
        let file = fs::File::open(path_file)?;
        let reader = BufReader::new(file);
        for line in reader.lines() {
            let source = line?.trim().to_string();
            if !source.is_empty() && !source.starts_with('#') {
                paths.push(source);
            }
        }
    }
    Ok(paths)
}

fn lookup_function<'a>(layout: &'a AbiLayout, function: &str) -> Result<&'a AbiTypeRef> {
    layout.function(function).map_err(|error| {
        Error::from(format!(
            "{}\navailable functions:\n{}",
            error,
            layout.to_string().trim_end()
        ))
    })
}

/// Render the argument type tree, one node per line.
fn format_types(root: &AbiTypeRef, json: bool) -> Result<String> {
    if json {
        Ok(serde_json::to_string_pretty(root.as_ref())? + "\n")
    } else {
        Ok(root.to_string())
    }
}

fn print_path(path: &SigningPath) {
    println!("{}", path.source());
    println!("  path:  {}", path);
    println!("  tlv:   {}", path.to_hex());
}

/// Indent continuation lines of a multi-line error message.
fn indent(message: &str) -> String {
    message.replace('\n', "\n  ")
}
