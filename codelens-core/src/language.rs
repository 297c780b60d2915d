//! Regex language heuristic.
//!
//! Each supported language owns an ordered list of patterns characteristic of its
//! syntax. A language's score is the number of its patterns that match anywhere in
//! the text; repeated matches of one pattern still count once. The highest
//! strictly-positive score wins and ties go to the language declared first in
//! [`Language::ALL`], so the result is deterministic.
//!
//! Runs on every edit, so patterns are compiled once into a static table.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

/// Languages the heuristic can report, in tie-breaking order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    TypeScript,
    JavaScript,
    Java,
    CSharp,
    Cpp,
    Go,
    Rust,
}

impl Language {
    /// Every language in declaration order. Ties resolve to the earlier entry.
    pub const ALL: [Language; 8] = [
        Language::Python,
        Language::TypeScript,
        Language::JavaScript,
        Language::Java,
        Language::CSharp,
        Language::Cpp,
        Language::Go,
        Language::Rust,
    ];

    /// Lowercase tag used in storage and shown in the UI.
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::TypeScript => "typescript",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::CSharp => "csharp",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rust",
        }
    }

    /// Human-readable name for display.
    pub fn display_name(self) -> &'static str {
        match self {
            Language::Python => "Python",
            Language::TypeScript => "TypeScript",
            Language::JavaScript => "JavaScript",
            Language::Java => "Java",
            Language::CSharp => "C#",
            Language::Cpp => "C++",
            Language::Go => "Go",
            Language::Rust => "Rust",
        }
    }

    /// File extension used to pick a syntax definition for highlighting.
    pub fn extension(self) -> &'static str {
        match self {
            Language::Python => "py",
            Language::TypeScript => "ts",
            Language::JavaScript => "js",
            Language::Java => "java",
            Language::CSharp => "cs",
            Language::Cpp => "cpp",
            Language::Go => "go",
            Language::Rust => "rs",
        }
    }

    /// Parses a tag or display name, case-insensitively.
    ///
    /// Accepts the aliases the analysis service tends to return (`"C#"`, `"C++"`,
    /// `"golang"`, `"js"`, `"ts"`).
    pub fn from_tag(tag: &str) -> Option<Language> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "python" | "py" => Some(Language::Python),
            "typescript" | "ts" => Some(Language::TypeScript),
            "javascript" | "js" => Some(Language::JavaScript),
            "java" => Some(Language::Java),
            "csharp" | "c#" | "cs" => Some(Language::CSharp),
            "cpp" | "c++" => Some(Language::Cpp),
            "go" | "golang" => Some(Language::Go),
            "rust" | "rs" => Some(Language::Rust),
            _ => None,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn patterns_for(language: Language) -> &'static [&'static str] {
    match language {
        Language::Python => &[
            r"\bdef\s+\w+\s*\(",
            r"(?m)^\s*from\s+[\w.]+\s+import\b",
            r"(?m)^\s*(if|elif|else|for|while|with|try|except|class)\b[^\n{;]*:\s*$",
            r"\bprint\s*\(",
            r"\bself\.\w+",
            r"\b(None|True|False)\b",
        ],
        Language::TypeScript => &[
            r"\binterface\s+\w+",
            r":\s*(string|number|boolean|any|void|unknown)\b",
            r"\btype\s+\w+\s*=",
            r"\b(private|public|protected|readonly)\s+\w+\s*[:(]",
            r"\benum\s+\w+\s*\{",
            r"\bas\s+(string|number|const)\b",
        ],
        Language::JavaScript => &[
            r"\bfunction\b",
            r"\b(const|let|var)\s+\w+\s*=",
            r"=>",
            r"\bconsole\.\w+\s*\(",
            r"\brequire\s*\(",
            r"\b(document|window)\.\w+",
        ],
        Language::Java => &[
            r"\bpublic\s+(static\s+)?(final\s+)?(class|void)\b",
            r"System\.out\.print",
            r"\bpublic\s+static\s+void\s+main\b",
            r"(?m)^\s*import\s+java\.",
            r"@Override\b",
            r"\bString\[\]\s+\w+",
        ],
        Language::CSharp => &[
            r"(?m)^\s*using\s+System\b",
            r"\bnamespace\s+[\w.]+",
            r"\bConsole\.Write(Line)?\s*\(",
            r"\bpublic\s+(async\s+)?Task\b",
            r"\{\s*get;\s*set;\s*\}",
            r"\bvar\s+\w+\s*=\s*new\b",
        ],
        Language::Cpp => &[
            r"#include\s*<[\w./]+>",
            r"\bstd::",
            r"\b(cout\s*<<|cin\s*>>)",
            r"\btemplate\s*<",
            r"\bint\s+main\s*\(",
            r"\bnullptr\b",
        ],
        Language::Go => &[
            r"(?m)^\s*package\s+\w+",
            r"\bfunc\s+(\(\s*\w+\s+\*?\w+\s*\)\s*)?\w+\s*\(",
            r":=",
            r"\bfmt\.\w+\s*\(",
            r"\bimport\s*\(",
            r"\b(go\s+func|chan\s+\w+)\b",
        ],
        Language::Rust => &[
            r"\bfn\s+\w+\s*[<(]",
            r"\blet\s+mut\b",
            r"\bimpl\b",
            r"\b\w+!\s*\(",
            r"(?m)^\s*use\s+\w+(::\w+)+",
            r"\bpub\s+(fn|struct|enum|mod)\b",
            r"&mut\s|&self\b",
        ],
    }
}

static PATTERNS: LazyLock<Vec<(Language, Vec<Regex>)>> = LazyLock::new(|| {
    Language::ALL
        .iter()
        .map(|&lang| {
            let compiled = patterns_for(lang)
                .iter()
                .map(|p| Regex::new(p).expect("language pattern is a valid regex"))
                .collect();
            (lang, compiled)
        })
        .collect()
});

/// Returns each language's score for `text`, in [`Language::ALL`] order.
pub fn scores(text: &str) -> Vec<(Language, usize)> {
    PATTERNS
        .iter()
        .map(|(lang, patterns)| {
            let score = patterns.iter().filter(|re| re.is_match(text)).count();
            (*lang, score)
        })
        .collect()
}

/// Returns the best-matching language, or `None` when nothing matches.
pub fn detect(text: &str) -> Option<Language> {
    let mut best: Option<(Language, usize)> = None;
    for (lang, score) in scores(text) {
        if score == 0 {
            continue;
        }
        // Strictly greater: the first language keeps a tie.
        if best.is_none_or(|(_, top)| score > top) {
            best = Some((lang, score));
        }
    }
    best.map(|(lang, _)| lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_plain_text_detect_nothing() {
        assert_eq!(detect(""), None);
        assert_eq!(detect("just some words here"), None);
        assert!(scores("12345").iter().all(|(_, s)| *s == 0));
    }

    #[test]
    fn python_print_call() {
        assert_eq!(detect("print('hi')"), Some(Language::Python));
    }

    #[test]
    fn python_merge_sort_sample() {
        let code = "def merge_sort(arr):\n    if len(arr) <= 1:\n        return arr\n";
        assert_eq!(detect(code), Some(Language::Python));
    }

    #[test]
    fn typescript_beats_javascript_on_annotations() {
        let code = "interface User {\n  id: number;\n  name: string;\n}\nconst u: User = load();";
        assert_eq!(detect(code), Some(Language::TypeScript));
    }

    #[test]
    fn javascript_fibonacci() {
        let code = "function fibonacci(n) {\n  if (n <= 1) return n;\n}\nconst result = fibonacci(10);\nconsole.log(result);";
        assert_eq!(detect(code), Some(Language::JavaScript));
    }

    #[test]
    fn java_hello_world() {
        let code = "public class Main {\n  public static void main(String[] args) {\n    System.out.println(\"hi\");\n  }\n}";
        assert_eq!(detect(code), Some(Language::Java));
    }

    #[test]
    fn cpp_iostream() {
        let code = "#include <iostream>\nint main() {\n  std::cout << \"hi\" << std::endl;\n}";
        assert_eq!(detect(code), Some(Language::Cpp));
    }

    #[test]
    fn go_package_main() {
        let code = "package main\n\nimport \"fmt\"\n\nfunc main() {\n  x := 1\n  fmt.Println(x)\n}";
        assert_eq!(detect(code), Some(Language::Go));
    }

    #[test]
    fn rust_function() {
        let code = "use std::collections::HashMap;\n\npub fn count(s: &str) -> usize {\n    let mut n = 0;\n    println!(\"{}\", s);\n    n\n}";
        assert_eq!(detect(code), Some(Language::Rust));
    }

    #[test]
    fn repeated_matches_count_once() {
        let once = scores("print(1)");
        let many = scores("print(1)\nprint(2)\nprint(3)");
        assert_eq!(once, many);
    }

    #[test]
    fn chosen_language_has_the_top_score() {
        let samples = [
            "def f(x):\n    return x",
            "const x = () => 1;",
            "let mut v = Vec::new();",
            "namespace App { class A { public int X { get; set; } } }",
            "interface A {}",
        ];
        for text in samples {
            let all = scores(text);
            let chosen = detect(text).expect("sample should be detected");
            let chosen_score = all.iter().find(|(l, _)| *l == chosen).map(|(_, s)| *s).unwrap();
            assert!(all.iter().all(|(_, s)| *s <= chosen_score), "{text}");
            assert_eq!(detect(text), Some(chosen), "detection is idempotent");
        }
    }

    #[test]
    fn ties_go_to_the_first_declared_language() {
        // `=>` scores one for JavaScript; `interface X` scores one for TypeScript.
        let text = "interface X\n=>";
        let all = scores(text);
        let ts = all.iter().find(|(l, _)| *l == Language::TypeScript).unwrap().1;
        let js = all.iter().find(|(l, _)| *l == Language::JavaScript).unwrap().1;
        assert_eq!(ts, js);
        assert_eq!(detect(text), Some(Language::TypeScript));
    }

    #[test]
    fn tags_round_trip_through_from_tag() {
        for lang in Language::ALL {
            assert_eq!(Language::from_tag(lang.as_str()), Some(lang));
        }
        assert_eq!(Language::from_tag("Python"), Some(Language::Python));
        assert_eq!(Language::from_tag("C#"), Some(Language::CSharp));
        assert_eq!(Language::from_tag("brainfuck"), None);
    }
}
