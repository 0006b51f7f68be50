// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

extern crate assert_cmd;
extern crate predicates;
extern crate tempfile;

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::process::Command;
use tempfile::tempdir;

fn fractals() -> Command {
    Command::cargo_bin("fractals").unwrap()
}

#[test]
fn renders_a_small_mandelbrot() {
    let dir = tempdir().unwrap();
    fractals()
        .args(&["-t", "render-mandelbrot", "-w", "40", "-h", "30", "--iterations", "100"])
        .arg("-d")
        .arg(dir.path())
        .args(&["-f", "small"])
        .assert()
        .success();
    assert!(dir.path().join("small.png").exists());
}

#[test]
fn negative_ranges_parse() {
    let dir = tempdir().unwrap();
    fractals()
        .args(&["-t", "render-escape-time", "-w", "20", "-h", "20"])
        .args(&["--real", "-1.5,-0.5", "--imaginary", "-0.5,0.5", "-r", "fire", "-q"])
        .arg("-d")
        .arg(dir.path())
        .assert()
        .success();
    assert!(dir.path().join("fractal.png").exists());
}

#[test]
fn finds_points_then_plots_them() {
    let dir = tempdir().unwrap();
    fractals()
        .args(&["-t", "find-points", "--bailout", "20,500", "--limit", "12", "--seed", "3"])
        .args(&["-s", "edge-biased", "-f", "seeds.bin"])
        .arg("-d")
        .arg(dir.path())
        .assert()
        .success();
    assert_eq!(fs::metadata(dir.path().join("seeds.bin")).unwrap().len(), 12 * 16);

    fractals()
        .args(&["-t", "plot-points", "-w", "32", "-h", "32", "--bailout", "20,500"])
        .args(&["-i", "*.bin", "-f", "plot"])
        .arg("-d")
        .arg(dir.path())
        .assert()
        .success();
    assert!(dir.path().join("plot.png").exists());
}

#[test]
fn zero_width_is_refused() {
    fractals()
        .args(&["-t", "render-mandelbrot", "-w", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Width must be positive"));
}

#[test]
fn unknown_operation_is_refused() {
    fractals()
        .args(&["-t", "render-teapot"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("render-teapot"));
}

#[test]
fn nebula_wants_three_inputs() {
    let dir = tempdir().unwrap();
    fractals()
        .args(&["-t", "render-nebula", "-i", "red*", "-i", "green*"])
        .arg("-d")
        .arg(dir.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("3 input patterns"));
}
