// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate clap;
extern crate failure;
extern crate fractals;
extern crate num_cpus;
#[macro_use]
extern crate tracing;
extern crate tracing_subscriber;

use clap::{App, Arg, ArgMatches};
use fractals::color::ColorRamp;
use fractals::generators::Strategy;
use fractals::{CancellationToken, Config, OperationKind};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::str::FromStr;
use std::thread;
use tracing::Level;

fn parse_pair<T>(s: &str, separator: char) -> Option<(T, T)>
where
    T: FromStr,
{
    match s.find(separator) {
        None => None,
        Some(index) => match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
            (Ok(l), Ok(r)) => Some((l, r)),
            _ => None,
        },
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_range<T: FromStr + Ord>(
    s: &str,
    low: T,
    isnotanumber_err: &str,
    isnotinrange_err: &str,
) -> Result<(), String> {
    match T::from_str(s) {
        Ok(i) => {
            if i >= low {
                Ok(())
            } else {
                Err(isnotinrange_err.to_string())
            }
        }
        Err(_) => Err(isnotanumber_err.to_string()),
    }
}

fn validate_name(s: &str, names: &[&str], kind: &str) -> Result<(), String> {
    if names.contains(&s) {
        Ok(())
    } else {
        Err(format!("Unknown {} '{}'; expected one of: {}", kind, s, names.join(", ")))
    }
}

const TYPE: &str = "type";
const WIDTH: &str = "width";
const HEIGHT: &str = "height";
const DIRECTORY: &str = "directory";
const FILENAME: &str = "filename";
const INPUT: &str = "input";
const INPUT_DIRECTORY: &str = "input-directory";
const REAL: &str = "real";
const IMAGINARY: &str = "imaginary";
const BAILOUT: &str = "bailout";
const ITERATIONS: &str = "iterations";
const STRATEGY: &str = "strategy";
const RAMP: &str = "ramp";
const THREADS: &str = "threads";
const LIMIT: &str = "limit";
const SEED: &str = "seed";
const NO_GRID: &str = "no-grid";
const NO_ROTATE: &str = "no-rotate";
const VERBOSE: &str = "verbose";
const QUIET: &str = "quiet";

fn args<'a>() -> ArgMatches<'a> {
    App::new("fractals")
        .version("0.1.0")
        .author("Elf M. Sternberg <elf.sternberg@gmail.com>")
        .about("Mandelbrot, Buddhabrot and Nebulabrot renderer")
        .arg(
            Arg::with_name(TYPE)
                .required(true)
                .long(TYPE)
                .short("t")
                .takes_value(true)
                .validator(|s| validate_name(&s, &OperationKind::names(), "operation"))
                .help("What to do"),
        )
        .arg(
            Arg::with_name(WIDTH)
                .long(WIDTH)
                .short("w")
                .takes_value(true)
                .default_value("800")
                .validator(|s| {
                    validate_range(&s, 1usize, "Could not parse width", "Width must be positive")
                })
                .help("Width of output image"),
        )
        .arg(
            Arg::with_name(HEIGHT)
                .long(HEIGHT)
                .short("h")
                .takes_value(true)
                .default_value("800")
                .validator(|s| {
                    validate_range(&s, 1usize, "Could not parse height", "Height must be positive")
                })
                .help("Height of output image"),
        )
        .arg(
            Arg::with_name(DIRECTORY)
                .long(DIRECTORY)
                .short("d")
                .takes_value(true)
                .default_value(".")
                .help("Output directory"),
        )
        .arg(
            Arg::with_name(FILENAME)
                .long(FILENAME)
                .short("f")
                .takes_value(true)
                .default_value("fractal")
                .help("Output file name; images get a .png extension"),
        )
        .arg(
            Arg::with_name(INPUT)
                .long(INPUT)
                .short("i")
                .takes_value(true)
                .multiple(true)
                .number_of_values(1)
                .help("Point file pattern, with * and ? wildcards; give three for render-nebula"),
        )
        .arg(
            Arg::with_name(INPUT_DIRECTORY)
                .long(INPUT_DIRECTORY)
                .takes_value(true)
                .help("Where to look for point files; defaults to the output directory"),
        )
        .arg(
            Arg::with_name(REAL)
                .long(REAL)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-2,1")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse real range"))
                .help("Real bounds of the viewport, as min,max"),
        )
        .arg(
            Arg::with_name(IMAGINARY)
                .long(IMAGINARY)
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-1.5,1.5")
                .validator(|s| validate_pair::<f64>(&s, ',', "Could not parse imaginary range"))
                .help("Imaginary bounds of the viewport, as min,max"),
        )
        .arg(
            Arg::with_name(BAILOUT)
                .long(BAILOUT)
                .takes_value(true)
                .default_value("20000,30000")
                .validator(|s| validate_pair::<usize>(&s, ',', "Could not parse bailout range"))
                .help("Escape counts a found point must fall between, as min,max"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .takes_value(true)
                .default_value("5000")
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        "Could not parse iteration count",
                        "Iteration count must be positive",
                    )
                })
                .help("Iteration ceiling when rendering the Mandelbrot set"),
        )
        .arg(
            Arg::with_name(STRATEGY)
                .long(STRATEGY)
                .short("s")
                .takes_value(true)
                .default_value("bulbs-excluded")
                .validator(|s| validate_name(&s, &Strategy::names(), "selection strategy"))
                .help("How the point finder picks candidates"),
        )
        .arg(
            Arg::with_name(RAMP)
                .long(RAMP)
                .short("r")
                .takes_value(true)
                .default_value("blue")
                .validator(|s| validate_name(&s, &ColorRamp::names(), "color ramp"))
                .help("Color ramp for escape-time and density images"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .takes_value(true)
                .validator(|s| {
                    validate_range(
                        &s,
                        1usize,
                        "Could not parse thread count",
                        "Thread count must be positive",
                    )
                })
                .help("Number of worker threads; defaults to one per CPU"),
        )
        .arg(
            Arg::with_name(LIMIT)
                .long(LIMIT)
                .takes_value(true)
                .validator(|s| {
                    validate_range(&s, 1usize, "Could not parse limit", "Limit must be positive")
                })
                .help("Stop finding points after this many"),
        )
        .arg(
            Arg::with_name(SEED)
                .long(SEED)
                .takes_value(true)
                .validator(|s| validate_range(&s, 0u64, "Could not parse seed", "Bad seed"))
                .help("Seed for reproducible sampling"),
        )
        .arg(
            Arg::with_name(NO_GRID)
                .long(NO_GRID)
                .help("Leave the coordinate grid off Mandelbrot images"),
        )
        .arg(
            Arg::with_name(NO_ROTATE)
                .long(NO_ROTATE)
                .help("Keep the real axis horizontal in density images"),
        )
        .arg(
            Arg::with_name(VERBOSE)
                .short("v")
                .multiple(true)
                .help("More logging; repeat for more"),
        )
        .arg(
            Arg::with_name(QUIET)
                .long(QUIET)
                .short("q")
                .conflicts_with(VERBOSE)
                .help("Only log warnings and errors"),
        )
        .get_matches()
}

// The validators have already run, so a failed parse here means a
// default value is broken.
fn value<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| T::from_str(s).ok())
        .ok_or_else(|| failure::err_msg(format!("could not parse --{}", name)))
}

fn pair<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<(T, T), failure::Error> {
    matches
        .value_of(name)
        .and_then(|s| parse_pair(s, ','))
        .ok_or_else(|| failure::err_msg(format!("could not parse --{}", name)))
}

fn config(matches: &ArgMatches) -> Result<Config, failure::Error> {
    Ok(Config {
        operation: value(matches, TYPE)?,
        width: value(matches, WIDTH)?,
        height: value(matches, HEIGHT)?,
        real: pair(matches, REAL)?,
        imaginary: pair(matches, IMAGINARY)?,
        bailout: pair(matches, BAILOUT)?,
        max_iterations: value(matches, ITERATIONS)?,
        strategy: value(matches, STRATEGY)?,
        ramp: value(matches, RAMP)?,
        threads: match matches.value_of(THREADS) {
            Some(_) => value(matches, THREADS)?,
            None => num_cpus::get(),
        },
        limit: match matches.value_of(LIMIT) {
            Some(_) => Some(value(matches, LIMIT)?),
            None => None,
        },
        seed: match matches.value_of(SEED) {
            Some(_) => Some(value(matches, SEED)?),
            None => None,
        },
        grid: !matches.is_present(NO_GRID),
        rotate: !matches.is_present(NO_ROTATE),
        directory: PathBuf::from(matches.value_of(DIRECTORY).unwrap_or(".")),
        input_directory: matches.value_of(INPUT_DIRECTORY).map(PathBuf::from),
        filename: value(matches, FILENAME)?,
        inputs: matches
            .values_of(INPUT)
            .map(|values| values.map(String::from).collect())
            .unwrap_or_default(),
    })
}

fn verbosity(matches: &ArgMatches) -> Level {
    if matches.is_present(QUIET) {
        return Level::WARN;
    }
    match matches.occurrences_of(VERBOSE) {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    }
}

// Raise the token when the user presses enter.  End of input is not
// a request to stop.
fn watch_stdin(cancel: CancellationToken) {
    eprintln!("Press <ENTER> to stop...");
    thread::spawn(move || {
        let stdin = io::stdin();
        let mut line = String::new();
        if let Ok(read) = stdin.lock().read_line(&mut line) {
            if read > 0 {
                info!("stop requested");
                cancel.cancel();
            }
        }
    });
}

fn main() -> Result<(), failure::Error> {
    let matches = args();
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(verbosity(&matches))
        .init();

    let settings = config(&matches)?.validate()?;
    let cancel = CancellationToken::new();
    if settings.operation == OperationKind::FindPoints {
        watch_stdin(cancel.clone());
    }
    fractals::run(&settings, &cancel)?;
    Ok(())
}
