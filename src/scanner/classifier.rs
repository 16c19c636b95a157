//! File classification
//!
//! Maps a file to a language from its extension (or name, for Dockerfiles) and
//! sniffs the lowercased content for a well-known framework.
//!
//! Supports: Python, JavaScript, TypeScript, Terraform, Kubernetes YAML, Java,
//! Go, Shell, Dockerfile

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    JavaScript,
    TypeScript,
    Terraform,
    Kubernetes,
    Java,
    Go,
    Shell,
    Dockerfile,
    Unknown,
}

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::JavaScript => "JavaScript",
            Language::TypeScript => "TypeScript",
            Language::Terraform => "Terraform",
            Language::Kubernetes => "Kubernetes",
            Language::Java => "Java",
            Language::Go => "Go",
            Language::Shell => "Shell",
            Language::Dockerfile => "Dockerfile",
            Language::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != Language::Unknown
    }

    /// Top-level keywords a plausible rewrite of this file type contains
    ///
    /// An empty slice means there is no structural check for the language.
    pub fn structural_keywords(&self) -> &'static [&'static str] {
        match self {
            Language::Terraform => &["resource", "module", "variable", "provider", "data", "output", "locals"],
            Language::Kubernetes => &["apiVersion:"],
            Language::Dockerfile => &["FROM"],
            _ => &[],
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stateless classifier for candidate files
pub struct FileClassifier;

impl FileClassifier {
    /// Detect language from file extension
    ///
    /// # Arguments
    /// * `file_path` - Path to the file
    ///
    /// # Returns
    /// * The mapped language, or `Language::Unknown` if the extension is not recognized
    pub fn detect_language(file_path: &Path) -> Language {
        let file_name = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or_default();
        if file_name == "Dockerfile" || file_name.starts_with("Dockerfile.") {
            return Language::Dockerfile;
        }

        let extension = file_path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match extension.as_deref() {
            Some("py") => Language::Python,
            Some("js") => Language::JavaScript,
            Some("ts") => Language::TypeScript,
            Some("tf") | Some("tfvars") => Language::Terraform,
            Some("yaml") | Some("yml") => Language::Kubernetes,
            Some("java") => Language::Java,
            Some("go") => Language::Go,
            Some("sh") => Language::Shell,
            _ => Language::Unknown,
        }
    }

    /// Sniff the framework from file content
    ///
    /// # Detection Priority
    /// 1. Python: django, flask, fastapi
    /// 2. JavaScript/TypeScript: next (import of a `next` module), express, react
    /// 3. Java: spring
    /// 4. Go: gin
    pub fn detect_framework(language: Language, content: &str) -> Option<String> {
        let lowered = content.to_lowercase();
        let found = |needle: &str| lowered.contains(needle);

        let framework = match language {
            Language::Python => {
                if found("django") {
                    Some("django")
                } else if found("flask") {
                    Some("flask")
                } else if found("fastapi") {
                    Some("fastapi")
                } else {
                    None
                }
            }
            Language::JavaScript | Language::TypeScript => {
                // Bare "next" also matches express middleware's next() callback
                if found("from 'next") || found("from \"next") || found("require('next") {
                    Some("next")
                } else if found("express") {
                    Some("express")
                } else if found("react") {
                    Some("react")
                } else {
                    None
                }
            }
            Language::Java if found("spring") => Some("spring"),
            Language::Go if found("gin-gonic") => Some("gin"),
            _ => None,
        };

        framework.map(str::to_string)
    }

    pub fn classify(file_path: &Path, content: &str) -> (Language, Option<String>) {
        let language = Self::detect_language(file_path);
        let framework = Self::detect_framework(language, content);
        (language, framework)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    // ============= Language Detection Tests =============

    #[test]
    fn test_detect_language_by_extension() {
        let cases = [
            ("app.py", Language::Python),
            ("index.js", Language::JavaScript),
            ("server.ts", Language::TypeScript),
            ("main.tf", Language::Terraform),
            ("prod.tfvars", Language::Terraform),
            ("deploy.yaml", Language::Kubernetes),
            ("service.yml", Language::Kubernetes),
            ("App.java", Language::Java),
            ("main.go", Language::Go),
            ("setup.sh", Language::Shell),
        ];

        for (name, expected) in cases {
            assert_eq!(
                FileClassifier::detect_language(&PathBuf::from(name)),
                expected,
                "wrong language for {}",
                name
            );
        }
    }

    #[test]
    fn test_detect_language_dockerfile_by_name() {
        assert_eq!(
            FileClassifier::detect_language(&PathBuf::from("docker/Dockerfile")),
            Language::Dockerfile
        );
        assert_eq!(
            FileClassifier::detect_language(&PathBuf::from("Dockerfile.prod")),
            Language::Dockerfile
        );
    }

    #[test]
    fn test_detect_language_unmapped_extension() {
        assert_eq!(FileClassifier::detect_language(&PathBuf::from("blob.bin")), Language::Unknown);
        assert_eq!(FileClassifier::detect_language(&PathBuf::from("README")), Language::Unknown);
        assert!(!Language::Unknown.is_known());
    }

    #[test]
    fn test_detect_language_uppercase_extension() {
        assert_eq!(FileClassifier::detect_language(&PathBuf::from("MAIN.TF")), Language::Terraform);
    }

    // ============= Framework Detection Tests =============

    #[test]
    fn test_python_frameworks() {
        let django = "from django.db import models\n";
        let flask = "from flask import Flask\napp = Flask(__name__)\n";
        let fastapi = "from fastapi import FastAPI\n";

        assert_eq!(FileClassifier::detect_framework(Language::Python, django), Some("django".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::Python, flask), Some("flask".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::Python, fastapi), Some("fastapi".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::Python, "print('hi')"), None);
    }

    #[test]
    fn test_javascript_frameworks() {
        let express = "const express = require('express');\napp.use((req, res, next) => next());";
        let next = "import Link from 'next/link';\nimport React from 'react';";
        let react = "import React from 'react';";

        assert_eq!(FileClassifier::detect_framework(Language::JavaScript, express), Some("express".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::TypeScript, next), Some("next".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::JavaScript, react), Some("react".to_string()));
    }

    #[test]
    fn test_java_and_go_frameworks() {
        let spring = "import org.springframework.boot.SpringApplication;";
        let gin = "import \"github.com/gin-gonic/gin\"";

        assert_eq!(FileClassifier::detect_framework(Language::Java, spring), Some("spring".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::Go, gin), Some("gin".to_string()));
        assert_eq!(FileClassifier::detect_framework(Language::Go, "package main"), None);
    }

    #[test]
    fn test_no_framework_for_infrastructure() {
        let content = "resource \"aws_instance\" \"web\" { ami = \"flask\" }";
        assert_eq!(FileClassifier::detect_framework(Language::Terraform, content), None);
    }

    #[test]
    fn test_classify_combines_both() {
        let (language, framework) =
            FileClassifier::classify(&PathBuf::from("api/views.py"), "import django\n");
        assert_eq!(language, Language::Python);
        assert_eq!(framework.as_deref(), Some("django"));
    }

    #[test]
    fn test_language_serializes_as_display_name() {
        assert_eq!(serde_json::to_string(&Language::Kubernetes).unwrap(), "\"Kubernetes\"");
        assert_eq!(Language::Terraform.to_string(), "Terraform");
    }
}
