// main.rs      burstgif command
//
// Copyright (c) 2019-2025  Douglas Lau
//
#![forbid(unsafe_code)]

use burstgif::{DitherKind, EncodedFrame, Encoder, QuantizerKind, Step};
use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use pix::{Raster, rgb::SRgba8};
use std::error::Error;
use std::ffi::OsStr;
use std::fs;
use std::io::Write;
use std::str::FromStr;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Auto);
    let res = match create_app().get_matches().subcommand() {
        ("encode", Some(matches)) => encode(&mut out, matches),
        _ => Ok(()),
    };
    if let Err(e) = &res {
        let mut red = ColorSpec::new();
        red.set_fg(Some(Color::Red)).set_intense(true);
        out.set_color(&red)?;
        writeln!(out, "error: {e}")?;
    }
    out.reset()?;
    res
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("burstgif")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("Animated GIF encoder")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("encode")
                .about("Encode raw RGBA frames into a GIF")
                .arg(
                    Arg::with_name("width")
                        .short("W")
                        .long("width")
                        .takes_value(true)
                        .required(true)
                        .help("canvas width"),
                )
                .arg(
                    Arg::with_name("height")
                        .short("H")
                        .long("height")
                        .takes_value(true)
                        .required(true)
                        .help("canvas height"),
                )
                .arg(
                    Arg::with_name("delay")
                        .short("d")
                        .long("delay")
                        .takes_value(true)
                        .default_value("100")
                        .help("frame delay (ms)"),
                )
                .arg(
                    Arg::with_name("loop")
                        .short("l")
                        .long("loop")
                        .takes_value(true)
                        .default_value("0")
                        .help("loop count (0: forever)"),
                )
                .arg(
                    Arg::with_name("quantizer")
                        .short("q")
                        .long("quantizer")
                        .takes_value(true)
                        .possible_values(&[
                            "uniform",
                            "mediancut",
                            "kmeans",
                            "random",
                            "octree",
                            "neuquant",
                        ])
                        .default_value("uniform")
                        .help("color quantizer"),
                )
                .arg(
                    Arg::with_name("dither")
                        .short("D")
                        .long("dither")
                        .takes_value(true)
                        .possible_values(&["none", "bayer", "fs", "m2"])
                        .default_value("none")
                        .help("ditherer"),
                )
                .arg(
                    Arg::with_name("workers")
                        .short("j")
                        .long("workers")
                        .takes_value(true)
                        .default_value("0")
                        .help("worker threads (max 8)"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .required(true)
                        .help("output GIF file"),
                )
                .arg(
                    Arg::with_name("frames")
                        .required(true)
                        .min_values(1)
                        .help("raw RGBA frame file(s)"),
                ),
        )
}

/// Parse a required argument value
fn value<T: FromStr>(
    matches: &ArgMatches,
    name: &str,
) -> Result<T, Box<dyn Error>> {
    let v = matches.value_of(name).unwrap_or_default();
    v.parse()
        .map_err(|_| format!("invalid {name}: {v:?}").into())
}

/// Handle encode subcommand
fn encode(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let width: u16 = value(matches, "width")?;
    let height: u16 = value(matches, "height")?;
    let delay: u32 = value(matches, "delay")?;
    let loop_count: u16 = value(matches, "loop")?;
    let quantizer: QuantizerKind = value(matches, "quantizer")?;
    let dither: DitherKind = value(matches, "dither")?;
    let workers: usize = value(matches, "workers")?;
    let output = matches.value_of_os("output").unwrap_or_default();
    let mut steps = vec![];
    for path in matches.values_of_os("frames").into_iter().flatten() {
        let raster = read_raster(path, width, height)?;
        let step = Step::with_true_color(raster)
            .with_delay_ms(delay)
            .with_quantizer(quantizer)
            .with_dither(dither);
        steps.push(step);
    }
    let mut enc = Encoder::create(output, width, height)?
        .with_loop_count(loop_count)
        .with_workers(workers)
        .open()?;
    let mut total = 0;
    for (n, frame) in enc.add_frames(&steps).into_iter().enumerate() {
        let frame = frame?;
        show_frame(out, n, &frame)?;
        total += frame.len();
        enc.flush(frame)?;
    }
    enc.finish()?;
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White)).set_intense(true).set_bold(true);
    out.set_color(&bold)?;
    writeln!(out, "{:?}: {} frames, {total} bytes", output, steps.len())?;
    Ok(())
}

/// Read one raw RGBA frame
fn read_raster(
    path: &OsStr,
    width: u16,
    height: u16,
) -> Result<Raster<SRgba8>, Box<dyn Error>> {
    let buf = fs::read(path)?;
    let len = usize::from(width) * usize::from(height) * 4;
    if buf.len() != len {
        return Err(format!(
            "{:?}: {} bytes, expected {len} for {width}x{height}",
            path,
            buf.len()
        )
        .into());
    }
    Ok(Raster::with_u8_buffer(width.into(), height.into(), buf))
}

/// Show one encoded frame
fn show_frame(
    out: &mut StandardStream,
    number: usize,
    frame: &EncodedFrame,
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    out.set_color(&yellow)?;
    write!(out, "{number:>4}")?;
    out.set_color(&dflt)?;
    writeln!(out, " {:>8} bytes", frame.len())?;
    Ok(())
}
