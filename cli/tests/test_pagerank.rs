/*
 * SPDX-FileCopyrightText: 2026 The linkrank authors
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use clap::Parser;
use linkrank_cli::{Cli, FloatVectorFormat, cli_main};
use serde_json::Value;
use std::path::Path;
use tempfile::Builder;

fn write(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[test]
fn test_cycle() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankCycle").tempdir()?;
    let vertices = tmp_dir.path().join("vertices.txt");
    let arcs = tmp_dir.path().join("arcs.csv");
    let output = tmp_dir.path().join("rank.txt");
    write(&vertices, "a\nb\nc\n")?;
    write(&arcs, "0,1\n1,2\n2,0\n")?;

    cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "--vertices",
        vertices.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
    ])?;

    let rank = FloatVectorFormat::Ascii.load(&output)?;
    assert_eq!(rank.len(), 3);
    for r in rank {
        assert!((r - 1.0 / 3.0).abs() < 1E-6);
    }
    Ok(())
}

#[test]
fn test_dangling() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankDangling").tempdir()?;
    let arcs = tmp_dir.path().join("arcs.tsv");
    let output = tmp_dir.path().join("rank.json");
    write(&arcs, "% comment\n0\t1\n")?;

    cli_main(vec![
        "linkrank",
        "pr",
        arcs.to_str().unwrap(),
        "--num-nodes",
        "2",
        "--separator",
        "\t",
        "--comment",
        "%",
        "-k",
        "100",
        "--fmt",
        "json",
        "-j",
        "2",
        "-o",
        output.to_str().unwrap(),
    ])?;

    let rank = FloatVectorFormat::Json.load(&output)?;
    assert!((rank[0] - 0.339082).abs() < 1E-6);
    assert!((rank[1] - 0.660918).abs() < 1E-6);
    Ok(())
}

#[test]
fn test_initial_and_threshold() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankInitial").tempdir()?;
    let arcs = tmp_dir.path().join("arcs.csv");
    let initial = tmp_dir.path().join("initial.bin");
    let output = tmp_dir.path().join("rank.bin");
    write(&arcs, "0,1\n0,2\n1,2\n2,0\n3,0\n")?;
    FloatVectorFormat::Java.store(&initial, &[1.0, 0.0, 0.0, 0.0, 0.0], None)?;

    cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "5",
        "--mode",
        "canonical",
        "--initial",
        initial.to_str().unwrap(),
        "--initial-fmt",
        "java",
        "-k",
        "1000",
        "--threshold",
        "1e-12",
        "--fmt",
        "java",
        "-o",
        output.to_str().unwrap(),
    ])?;

    let rank = FloatVectorFormat::Java.load(&output)?;
    assert_eq!(rank.len(), 5);
    assert!((rank.iter().sum::<f64>() - 1.0).abs() < 1E-9);
    assert!(rank[0] > rank[3]);
    Ok(())
}

#[test]
fn test_summary() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankSummary").tempdir()?;
    let vertices = tmp_dir.path().join("vertices.txt");
    let arcs = tmp_dir.path().join("arcs.csv");
    let output = tmp_dir.path().join("rank.txt");
    let summary = tmp_dir.path().join("web").join("pagerank.json");
    write(&vertices, "home\nabout\nblog\n")?;
    write(&arcs, "0,1\n0,2\n1,0\n2,0\n")?;

    cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "--vertices",
        vertices.to_str().unwrap(),
        "-o",
        output.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ])?;

    let rank = FloatVectorFormat::Ascii.load(&output)?;
    let value: Value = serde_json::from_str(&std::fs::read_to_string(&summary)?)?;
    assert_eq!(value["nodes"], serde_json::json!(["home", "about", "blog"]));
    assert_eq!(
        value["edges"],
        serde_json::json!([[0, 1], [0, 2], [1, 0], [2, 0]])
    );
    let pagerank: Vec<f64> = serde_json::from_value(value["pagerank"].clone())?;
    assert_eq!(pagerank, rank);
    assert!(pagerank[0] > pagerank[1]);

    // A summary needs labels
    let result = Cli::try_parse_from([
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "3",
        "-o",
        output.to_str().unwrap(),
        "--summary",
        summary.to_str().unwrap(),
    ]);
    assert!(result.is_err());
    Ok(())
}

#[test]
fn test_zero_iterations() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankZeroIterations").tempdir()?;
    let arcs = tmp_dir.path().join("arcs.csv");
    let initial = tmp_dir.path().join("initial.txt");
    let output = tmp_dir.path().join("rank.txt");
    write(&arcs, "0,1\n1,0\n")?;
    write(&initial, "2\n6\n")?;

    cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "2",
        "--initial",
        initial.to_str().unwrap(),
        "-k",
        "0",
        "-o",
        output.to_str().unwrap(),
    ])?;

    assert_eq!(FloatVectorFormat::Ascii.load(&output)?, vec![0.25, 0.75]);
    Ok(())
}

#[test]
fn test_errors() -> Result<()> {
    let tmp_dir = Builder::new().prefix("PageRankErrors").tempdir()?;
    let arcs = tmp_dir.path().join("arcs.csv");
    let output = tmp_dir.path().join("rank.txt");

    write(&arcs, "0,1\n1,5\n")?;
    let result = cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "3",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(result.is_err());
    assert!(!output.exists());

    write(&arcs, "0,1\n1 2\n")?;
    let result = cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "3",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(result.is_err());

    write(&arcs, "0,1\n")?;
    let result = cli_main(vec![
        "linkrank",
        "pagerank",
        arcs.to_str().unwrap(),
        "-n",
        "3",
        "--alpha",
        "1",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(result.is_err());

    let result = cli_main(vec![
        "linkrank",
        "pagerank",
        tmp_dir.path().join("missing.csv").to_str().unwrap(),
        "-n",
        "3",
        "-o",
        output.to_str().unwrap(),
    ]);
    assert!(result.is_err());
    assert!(!output.exists());
    Ok(())
}
