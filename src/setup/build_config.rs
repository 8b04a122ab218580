//! Generation of `build.ini` from the resolved dependency versions

use crate::config::DependencyManifest;
use crate::error::PipelineError;
use crate::util::write_atomic;
use std::path::Path;

/// Project-specific values written into the build configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    /// Directory holding the library sources
    pub library_root: String,
    /// Bundle written by the compiler
    pub out_file: String,
    /// Namespace handed to closurebuilder as the entry point
    pub compile_namespace: String,
}

impl Default for ProjectLayout {
    fn default() -> Self {
        Self {
            library_root: "HermesJS".to_string(),
            out_file: "out/HermesJS.js".to_string(),
            compile_namespace: "HermesJS.main".to_string(),
        }
    }
}

pub fn closure_library_path(version: &str) -> String {
    format!("closure-library/closure-library-{}", version)
}

pub fn closure_compiler_path(version: &str) -> String {
    format!("closure-compiler/closure-compiler-v{}.jar", version)
}

pub fn protobuf_library_path(version: &str) -> String {
    format!("protobuf/protobuf-{}/js", version)
}

/// Renders the four-section build configuration
pub fn render_build_config(layout: &ProjectLayout, manifest: &DependencyManifest) -> String {
    let sections: [(&str, Vec<(&str, String)>); 4] = [
        (
            "LIBRARY",
            vec![
                ("Root", layout.library_root.clone()),
                ("OutFile", layout.out_file.clone()),
            ],
        ),
        (
            "NAMESPACES",
            vec![("CompileNamespace", layout.compile_namespace.clone())],
        ),
        (
            "CLOSURE",
            vec![
                (
                    "Library",
                    closure_library_path(&manifest.closure_library.version),
                ),
                (
                    "Compiler",
                    closure_compiler_path(&manifest.closure_compiler.version),
                ),
            ],
        ),
        (
            "PROTOBUF",
            vec![("Library", protobuf_library_path(&manifest.protobuf.version))],
        ),
    ];

    let mut out = String::new();
    for (index, (section, entries)) in sections.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(&format!("[{}]\n", section));
        for (key, value) in entries {
            out.push_str(&format!("{} = {}\n", key, value));
        }
    }
    out
}

/// Writes the build configuration, replacing any existing file
pub fn write_build_config(
    path: &Path,
    layout: &ProjectLayout,
    manifest: &DependencyManifest,
) -> Result<(), PipelineError> {
    write_atomic(path, &render_build_config(layout, manifest))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BuildSettings, Configuration, Dependency, DependencyKind};

    fn dependency(kind: DependencyKind, version: &str) -> Dependency {
        Dependency {
            kind,
            url: format!("https://example.com/{}.zip", kind.install_dir()),
            version: version.to_string(),
            sha256: None,
        }
    }

    fn manifest() -> DependencyManifest {
        DependencyManifest {
            closure_library: dependency(DependencyKind::ClosureLibrary, "20170124"),
            closure_compiler: dependency(DependencyKind::ClosureCompiler, "20170218"),
            protobuf: dependency(DependencyKind::Protobuf, "3.2.0"),
        }
    }

    #[test]
    fn test_render_exact_output() {
        let rendered = render_build_config(&ProjectLayout::default(), &manifest());

        let expected = "\
[LIBRARY]
Root = HermesJS
OutFile = out/HermesJS.js

[NAMESPACES]
CompileNamespace = HermesJS.main

[CLOSURE]
Library = closure-library/closure-library-20170124
Compiler = closure-compiler/closure-compiler-v20170218.jar

[PROTOBUF]
Library = protobuf/protobuf-3.2.0/js
";
        assert_eq!(rendered, expected);
    }

    #[test]
    fn test_rendered_config_reads_back() {
        let rendered = render_build_config(&ProjectLayout::default(), &manifest());
        let config = Configuration::from_str_named("build.ini", &rendered).unwrap();
        let settings = BuildSettings::from_config(&config).unwrap();

        assert_eq!(settings.closure_library, "closure-library/closure-library-20170124");
        assert_eq!(
            settings.protobuf_library.as_deref(),
            Some("protobuf/protobuf-3.2.0/js")
        );
    }

    #[test]
    fn test_custom_layout() {
        let layout = ProjectLayout {
            library_root: "src".to_string(),
            out_file: "dist/app.js".to_string(),
            compile_namespace: "app.main".to_string(),
        };
        let rendered = render_build_config(&layout, &manifest());

        assert!(rendered.contains("Root = src\n"));
        assert!(rendered.contains("OutFile = dist/app.js\n"));
        assert!(rendered.contains("CompileNamespace = app.main\n"));
    }

    #[test]
    fn test_write_overwrites_existing() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("build.ini");
        std::fs::write(&path, "[STALE]\nkey = value\n").unwrap();

        write_build_config(&path, &ProjectLayout::default(), &manifest()).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(!written.contains("STALE"));
        assert!(written.starts_with("[LIBRARY]\n"));
    }
}
