//! # Pagewright CLI
//!
//! Usage:
//!   pagewright input.json -o output.pdf
//!   echo '{ ... }' | pagewright -o output.pdf
//!   pagewright input.json --commands > pages.json
//!   pagewright --example > report.json
//!
//! Set `RUST_LOG=debug` to see scaling and page counts.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

use pagewright::{PaginateError, Report};

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.iter().any(|a| a == "--example") {
        print!("{}", example_report_json());
        return;
    }

    if let Err(e) = run(&args) {
        eprintln!("✗ {}", e);
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), PaginateError> {
    let input = match args.get(1).filter(|a| !a.starts_with('-')) {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    let report = Report::from_json(&input)?;

    if args.iter().any(|a| a == "--commands") {
        let pages = pagewright::render(&report)?;
        let json = serde_json::to_string_pretty(&pages).map_err(io::Error::other)?;
        println!("{}", json);
        return Ok(());
    }

    let output_path = args
        .windows(2)
        .find(|w| w[0] == "-o")
        .map(|w| w[1].clone())
        .unwrap_or_else(|| "output.pdf".to_string());

    let pdf_bytes = pagewright::render_pdf(&report)?;
    fs::write(&output_path, &pdf_bytes)?;
    eprintln!("✓ Written {} bytes to {}", pdf_bytes.len(), output_path);
    Ok(())
}

fn example_report_json() -> &'static str {
    r##"{
  "width": 800,
  "height": 1100,
  "marginBounds": true,
  "page": {
    "size": "A4",
    "margins": { "top": 36, "right": 36, "bottom": 36, "left": 36 }
  },
  "sections": [
    {
      "repeating": true,
      "fields": [
        {
          "bounds": { "x": 0, "y": 0, "width": 800, "height": 40 },
          "style": {
            "align": "MiddleLeft",
            "font": { "family": "Helvetica", "size": 14, "weight": 700 },
            "border": { "width": 1, "color": "#1e1e2e" }
          },
          "kind": { "type": "label", "text": "Quarterly Inventory Report" }
        },
        {
          "bounds": { "x": 0, "y": 1060, "width": 800, "height": 40 },
          "style": { "align": "MiddleRight" },
          "kind": { "type": "label", "text": "Page [pn] of [pc]", "isPageNumber": true }
        }
      ]
    },
    {
      "offset": { "x": 0, "y": 60 },
      "fields": [
        {
          "bounds": { "x": 0, "y": 0, "width": 40, "height": 300 },
          "style": { "align": "MiddleCenter", "backColor": "#f0f0f5" },
          "kind": { "type": "verticalLabel", "text": "Warehouse A" }
        },
        {
          "bounds": { "x": 60, "y": 0, "width": 740, "height": 980 },
          "stageIndex": 0,
          "style": { "font": { "family": "Helvetica", "size": 9 } },
          "kind": {
            "type": "table",
            "headerColor": "#1e1e2e",
            "headerForeColor": "#ffffff",
            "columns": [
              { "text": "SKU", "width": 120 },
              { "text": "Description", "width": 380 },
              { "text": "Qty", "width": 100, "align": "Right" },
              { "text": "Unit Price", "width": 140, "align": "Right" }
            ],
            "rows": [
              { "cells": ["A-1001", "Steel bracket, 40mm", "1,200", "$0.45"] },
              { "cells": ["A-1002", "Steel bracket, 60mm", "860", "$0.62"], "useRowStyle": true, "backColor": "#f7f7fa" },
              { "cells": ["A-1010", "Hinge, brass", "340", "$1.90"] },
              { "cells": ["B-2001", { "text": "Gasket kit (discontinued)", "foreColor": "#b00020" }, "12", "$7.50"] },
              { "cells": ["B-2002", "O-ring assortment", "95", "$4.25"] }
            ]
          }
        },
        {
          "bounds": { "x": 60, "y": 1000, "width": 740, "height": 40 },
          "stageIndex": 1,
          "kind": { "type": "text", "text": "Counts reflect the close of business on the last day of the quarter. Items marked in red are no longer reordered." }
        }
      ]
    }
  ]
}"##
}
