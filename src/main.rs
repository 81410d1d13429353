//! # Folio CLI
//!
//! Usage:
//!   folio input.json -o layout.json
//!   echo '{ ... }' | folio
//!   folio --example > request.json
//!
//! Set `RUST_LOG=debug` to trace break decisions.

use std::env;
use std::fs;
use std::io::{self, Read};
use std::process;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    // Handle --example flag
    if args.iter().any(|a| a == "--example") {
        print!("{}", example_request_json());
        return;
    }

    if let Err(message) = run(&args) {
        eprintln!("✗ {message}");
        process::exit(1);
    }
}

fn run(args: &[String]) -> Result<(), String> {
    // Read input
    let input = match args.get(1).filter(|a| !a.starts_with('-')) {
        Some(path) => {
            fs::read_to_string(path).map_err(|e| format!("Failed to read {path}: {e}"))?
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("Failed to read stdin: {e}"))?;
            buf
        }
    };

    // Parse output path
    let output_path = args.windows(2).find(|w| w[0] == "-o").map(|w| w[1].clone());

    let layout = folio::layout_json(&input).map_err(|e| e.to_string())?;

    match output_path {
        Some(path) => {
            fs::write(&path, &layout).map_err(|e| format!("Failed to write {path}: {e}"))?;
            eprintln!("✓ Written {} bytes to {}", layout.len(), path);
        }
        None => println!("{layout}"),
    }
    Ok(())
}

fn example_request_json() -> &'static str {
    r##"{
  "options": {
    "pageSize": { "w": 816, "h": 1056 },
    "margins": { "top": 96, "right": 96, "bottom": 96, "left": 96, "header": 48, "footer": 48 },
    "columns": { "count": 1, "gap": 0 }
  },
  "footer": {
    "blocks": [
      {
        "id": "footer-text",
        "kind": {
          "type": "paragraph",
          "runs": [
            { "type": "text", "text": "Page " },
            { "type": "token", "token": { "type": "pageNumber" }, "text": "1" }
          ]
        }
      }
    ],
    "measures": [
      { "kind": "paragraph", "lines": [ { "height": 18 } ], "totalHeight": 18 }
    ],
    "constraints": { "width": 624, "height": 48 }
  },
  "blocks": [
    {
      "id": "title",
      "keepWithNext": true,
      "kind": {
        "type": "paragraph",
        "runs": [ { "type": "text", "text": "Quarterly Report" } ],
        "spacing": { "before": 0, "after": 12 },
        "bookmarks": ["top"]
      }
    },
    {
      "id": "intro",
      "kind": {
        "type": "paragraph",
        "runs": [ { "type": "text", "text": "Revenue grew in every region this quarter." } ],
        "spacing": { "before": 0, "after": 8 }
      }
    },
    {
      "id": "figures",
      "kind": {
        "type": "table",
        "headerRowCount": 1,
        "rows": [ {}, {}, {}, {} ]
      }
    },
    { "id": "br", "kind": { "type": "pageBreak" } },
    {
      "id": "appendix",
      "kind": {
        "type": "paragraph",
        "runs": [ { "type": "text", "text": "Appendix" } ]
      }
    }
  ],
  "measures": [
    { "kind": "paragraph", "lines": [ { "height": 32 } ], "totalHeight": 32 },
    {
      "kind": "paragraph",
      "lines": [ { "height": 20 }, { "height": 20 }, { "height": 20 } ],
      "totalHeight": 60
    },
    {
      "kind": "table",
      "rows": [ { "height": 28 }, { "height": 24 }, { "height": 24 }, { "height": 24 } ],
      "columnWidths": [ 312, 156, 156 ],
      "totalWidth": 624,
      "totalHeight": 100
    },
    { "kind": "empty" },
    { "kind": "paragraph", "lines": [ { "height": 20 } ], "totalHeight": 20 }
  ]
}
"##
}
