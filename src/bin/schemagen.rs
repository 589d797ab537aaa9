/// CLI: resolves schema documents and writes one generated source file per
/// type plus the validation-support file.
///
/// Usage:
///   schemagen generate <out-dir> <package> <json|yaml> [--parent NAME] <schema>...
use std::path::Path;

use schemagen::emit_rs;
use schemagen::resolver::Resolver;
use schemagen::schema::{parse_document, SourceFormat};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.first().map(String::as_str) != Some("generate") {
        usage();
    }

    let mut parent: Option<String> = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--parent" => {
                i += 1;
                match args.get(i) {
                    Some(name) => parent = Some(name.clone()),
                    None => usage(),
                }
            }
            "--help" | "-h" => usage(),
            other => positional.push(other),
        }
        i += 1;
    }
    let [out_dir, package, format_name, schema_files @ ..] = positional.as_slice() else {
        usage();
    };
    if schema_files.is_empty() {
        usage();
    }
    let Some(format) = SourceFormat::parse(format_name) else {
        eprintln!("Unknown format: {format_name}. Use 'json' or 'yaml'.");
        std::process::exit(1);
    };

    if let Err(e) = std::fs::create_dir_all(out_dir) {
        eprintln!("Cannot create {out_dir}: {e}");
        std::process::exit(1);
    }

    for file in schema_files {
        generate_file(Path::new(out_dir), package, format, parent.as_deref(), file);
    }

    let support = emit_rs::emit_support(package);
    write_source(Path::new(out_dir), emit_rs::support_file_name(), &support);
}

fn generate_file(
    out_dir: &Path,
    package: &str,
    format: SourceFormat,
    parent: Option<&str>,
    file: &str,
) {
    let text = std::fs::read_to_string(file).unwrap_or_else(|e| {
        eprintln!("Cannot read {file}: {e}");
        std::process::exit(1);
    });
    let schema = parse_document(&text, format).unwrap_or_else(|e| {
        eprintln!("{file}: {e}");
        std::process::exit(1);
    });
    let mut resolver = Resolver::new();
    let declarations = resolver.resolve_document(&schema, parent).unwrap_or_else(|e| {
        eprintln!("{file}: {e}");
        std::process::exit(1);
    });
    tracing::info!(file, count = declarations.len(), "resolved schema document");
    for decl in &declarations {
        let source = emit_rs::emit_declaration(package, decl);
        write_source(out_dir, &emit_rs::file_name(decl), &source);
    }
}

fn write_source(out_dir: &Path, name: &str, source: &str) {
    let path = out_dir.join(name);
    if let Err(e) = std::fs::write(&path, source) {
        eprintln!("Cannot write {}: {e}", path.display());
        std::process::exit(1);
    }
}

fn usage() -> ! {
    eprintln!("Usage: schemagen generate <out-dir> <package> <json|yaml> [--parent NAME] <schema>...");
    eprintln!("  Resolves each schema document and writes one source file per type");
    eprintln!("  plus the validation-support file into <out-dir>.");
    std::process::exit(2);
}
