// main.rs      gifpix command
//
// Copyright (c) 2020  Douglas Lau
//
#![forbid(unsafe_code)]

use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use gifpix::block::DisposalMethod;
use gifpix::{ChannelOrder, DecodedGif, Decoder, Step};
use std::error::Error;
use std::fs;
use std::io::Write;
use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

/// Crate version
const VERSION: &'static str = std::env!("CARGO_PKG_VERSION");

/// Main entry point
fn main() -> Result<(), Box<dyn Error>> {
    env_logger::builder().format_timestamp(None).init();
    let mut out = StandardStream::stdout(ColorChoice::Always);
    match create_app().get_matches().subcommand() {
        ("show", Some(matches)) => show(&mut out, matches)?,
        _ => panic!(),
    }
    out.reset()?;
    Ok(())
}

/// Create clap App
fn create_app() -> App<'static, 'static> {
    App::new("gifpix")
        .version(VERSION)
        .setting(AppSettings::GlobalVersion)
        .about("GIF decoding utility")
        .setting(AppSettings::ArgRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("show")
                .about("Show GIF frame table")
                .arg(
                    Arg::with_name("bgr")
                        .long("bgr")
                        .help("decode with BGR channel order"),
                )
                .arg(
                    Arg::with_name("files")
                        .required(true)
                        .min_values(1)
                        .help("input file(s)"),
                ),
        )
}

/// Show the frame table for each file
fn show(
    out: &mut StandardStream,
    matches: &ArgMatches,
) -> Result<(), Box<dyn Error>> {
    let channel_order = if matches.is_present("bgr") {
        ChannelOrder::Bgr
    } else {
        ChannelOrder::Rgb
    };
    if let Some(files) = matches.values_of("files") {
        for path in files {
            let buf = fs::read(path)?;
            let decoded = Decoder::new(&buf)
                .channel_order(channel_order)
                .decode()?;
            show_file(out, path, &decoded)?;
        }
    }
    Ok(())
}

/// Show one decoded file
fn show_file(
    out: &mut StandardStream,
    path: &str,
    decoded: &DecodedGif,
) -> Result<(), Box<dyn Error>> {
    let mut magenta = ColorSpec::new();
    magenta.set_fg(Some(Color::Magenta));
    let mut yellow = ColorSpec::new();
    yellow.set_fg(Some(Color::Yellow)).set_intense(true);
    let mut cyan = ColorSpec::new();
    cyan.set_fg(Some(Color::Cyan)).set_intense(true);
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let metadata = decoded.metadata();
    let steps = decoded.steps();
    let frame_digits = digits(steps.len()).max(3);
    let width = metadata.screen_width();
    let height = metadata.screen_height();
    let size_digits = 4.max(1 + digits(width) + digits(height));
    let mut comments = vec![];
    for cmt in metadata.comments() {
        for c in cmt.comments() {
            for l in String::from_utf8_lossy(c).split('\n') {
                let l = l.trim();
                if !l.is_empty() {
                    comments.push(l.to_string());
                }
            }
        }
    }
    out.set_color(&magenta)?;
    writeln!(out, "{}", path)?;
    out.set_color(&bold)?;
    write!(out, "{}, frames: {}", metadata.header(), steps.len())?;
    if let Some(c) = metadata.loop_count() {
        write!(out, ", repeat: ")?;
        if c == 0 {
            write!(out, "∞")?;
        } else {
            write!(out, "{}", c)?;
        }
    }
    writeln!(out)?;
    if !comments.is_empty() {
        out.set_color(&cyan)?;
        for c in comments {
            writeln!(out, "  # {}", c)?;
        }
    }
    out.set_color(&yellow)?;
    write!(out, "{:>w$}", "Fr#", w = frame_digits)?;
    write!(out, "  Delay Disp")?;
    write!(out, " {:>w$}", "Size", w = size_digits)?;
    write!(out, " {:>w$}", "X,Y", w = size_digits)?;
    writeln!(out, " Clrs Trn")?;
    let global_clr = metadata.color_table_config().len();
    for (n, step) in steps.iter().enumerate() {
        write_step(
            out,
            step,
            width,
            height,
            global_clr,
            n,
            frame_digits,
            size_digits,
        )?;
    }
    Ok(())
}

/// Write one step of the frame table
fn write_step(
    out: &mut StandardStream,
    step: &Step,
    width: u16,
    height: u16,
    global_clr: usize,
    number: usize,
    frame_digits: usize,
    size_digits: usize,
) -> Result<(), Box<dyn Error>> {
    let mut dflt = ColorSpec::new();
    dflt.set_fg(Some(Color::White));
    let mut bold = ColorSpec::new();
    bold.set_fg(Some(Color::White))
        .set_intense(true)
        .set_bold(true);
    let mut red = ColorSpec::new();
    red.set_fg(Some(Color::Red)).set_intense(true);
    out.set_color(&bold)?;
    write!(out, "{:>w$}", number, w = frame_digits)?;
    let d = step.delay_time_cs().unwrap_or(0);
    if d == 0 {
        out.set_color(&dflt)?;
    }
    write!(out, " {:6.2}", d as f32 / 100f32)?;
    let d = if let Some(gc) = step.graphic_control_ext() {
        match gc.disposal_method() {
            DisposalMethod::NoAction => "none",
            DisposalMethod::Keep => "keep",
            DisposalMethod::Background => "bg",
            DisposalMethod::Previous => "prev",
            _ => "res",
        }
    } else {
        "-"
    };
    out.set_color(match d {
        "none" | "-" => &dflt,
        "res" => &red,
        _ => &bold,
    })?;
    write!(out, " {:>4}", d)?;
    if width == step.width() && height == step.height() {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{}x{}", step.width(), step.height()),
        w = size_digits
    )?;
    if step.left() == 0 && step.top() == 0 {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    write!(
        out,
        " {:>w$}",
        &format!("{},{}", step.left(), step.top()),
        w = size_digits
    )?;
    match step.local_color_table() {
        Some(tbl) => {
            out.set_color(&bold)?;
            write!(out, "  {:3}", tbl.len())?;
        }
        None => {
            out.set_color(&dflt)?;
            write!(out, " {:3}g", global_clr)?;
        }
    }
    let tc = match step.transparent_color() {
        Some(tc) => format!("{}", tc),
        None => "-".to_string(),
    };
    if tc == "-" {
        out.set_color(&dflt)?;
    } else {
        out.set_color(&bold)?;
    }
    writeln!(out, " {:>3}", tc)?;
    Ok(())
}

fn digits<T: Into<usize>>(v: T) -> usize {
    let v = v.into();
    match v {
        0..=9 => 1,
        10..=99 => 2,
        100..=999 => 3,
        1000..=9999 => 4,
        _ => 5,
    }
}
