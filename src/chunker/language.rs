use std::path::Path;

/// Languages with dedicated split points. Anything else goes through the
/// generic recursive splitter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    C,
    Cpp,
    CSharp,
    Cobol,
    Elixir,
    Go,
    Haskell,
    Html,
    Java,
    Js,
    Kotlin,
    Latex,
    Lua,
    Markdown,
    Perl,
    Php,
    PowerShell,
    Proto,
    Python,
    Rst,
    Ruby,
    Rust,
    Scala,
    Solidity,
    Swift,
    Ts,
}

impl Language {
    /// Maps a file extension (without the dot, lowercase) to a language.
    pub fn from_extension(ext: &str) -> Option<Self> {
        let language = match ext {
            "cpp" | "cc" | "cxx" | "c++" => Language::Cpp,
            "go" => Language::Go,
            "java" => Language::Java,
            "kt" | "kts" => Language::Kotlin,
            "js" | "mjs" => Language::Js,
            "ts" => Language::Ts,
            "php" => Language::Php,
            "proto" => Language::Proto,
            "py" | "pyw" => Language::Python,
            "rst" => Language::Rst,
            "rb" => Language::Ruby,
            "rs" => Language::Rust,
            "scala" => Language::Scala,
            "swift" => Language::Swift,
            "md" | "markdown" => Language::Markdown,
            "tex" => Language::Latex,
            "html" | "htm" => Language::Html,
            "sol" => Language::Solidity,
            "cs" => Language::CSharp,
            "cbl" | "cob" => Language::Cobol,
            "c" | "h" => Language::C,
            "lua" => Language::Lua,
            "pl" | "pm" => Language::Perl,
            "hs" => Language::Haskell,
            "ex" | "exs" => Language::Elixir,
            "ps1" => Language::PowerShell,
            _ => return None,
        };
        Some(language)
    }

    /// Infers the language from a file path's extension.
    pub fn from_path(path: &str) -> Option<Self> {
        let ext = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|s| s.to_lowercase())?;
        Self::from_extension(&ext)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Cobol => "cobol",
            Language::Elixir => "elixir",
            Language::Go => "go",
            Language::Haskell => "haskell",
            Language::Html => "html",
            Language::Java => "java",
            Language::Js => "javascript",
            Language::Kotlin => "kotlin",
            Language::Latex => "latex",
            Language::Lua => "lua",
            Language::Markdown => "markdown",
            Language::Perl => "perl",
            Language::Php => "php",
            Language::PowerShell => "powershell",
            Language::Proto => "proto",
            Language::Python => "python",
            Language::Rst => "rst",
            Language::Ruby => "ruby",
            Language::Rust => "rust",
            Language::Scala => "scala",
            Language::Solidity => "solidity",
            Language::Swift => "swift",
            Language::Ts => "typescript",
        }
    }

    /// Separator lists ordered from most to least semantically significant.
    /// Every list ends with blank line, newline, space, and the empty string
    /// so recursion always bottoms out at character level.
    pub fn separators(&self) -> &'static [&'static str] {
        match self {
            Language::C | Language::Cpp => &[
                "\nclass ", "\nvoid ", "\nint ", "\nfloat ", "\ndouble ", "\nif ", "\nfor ",
                "\nwhile ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::CSharp => &[
                "\ninterface ", "\nenum ", "\ndelegate ", "\nevent ", "\nclass ", "\nabstract ",
                "\npublic ", "\nprotected ", "\nprivate ", "\nstatic ", "\nreturn ", "\nif ",
                "\nfor ", "\nforeach ", "\nwhile ", "\nswitch ", "\ncase ", "\ntry ", "\ncatch ",
                "\n\n", "\n", " ", "",
            ],
            Language::Cobol => &[
                "\nIDENTIFICATION DIVISION.", "\nENVIRONMENT DIVISION.", "\nDATA DIVISION.",
                "\nPROCEDURE DIVISION.", "\nSECTION.", "\n\n", "\n", " ", "",
            ],
            Language::Elixir => &[
                "\ndefmodule ", "\ndefprotocol ", "\ndefimpl ", "\ndef ", "\ndefp ",
                "\ndefmacro ", "\nif ", "\ncase ", "\ncond ", "\nwith ", "\n\n", "\n", " ", "",
            ],
            Language::Go => &[
                "\nfunc ", "\nvar ", "\nconst ", "\ntype ", "\nif ", "\nfor ", "\nswitch ",
                "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::Haskell => &[
                "\ndata ", "\nnewtype ", "\ntype ", "\nclass ", "\ninstance ", "\nmodule ",
                "\nimport ", "\nwhere ", "\n\n", "\n", " ", "",
            ],
            Language::Html => &[
                "<body", "<div", "<p", "<br", "<li", "<h1", "<h2", "<h3", "<h4", "<h5", "<h6",
                "<span", "<table", "<tr", "<td", "<ul", "<ol", "<header", "<footer", "<nav",
                "\n\n", "\n", " ", "",
            ],
            Language::Java => &[
                "\nclass ", "\npublic ", "\nprotected ", "\nprivate ", "\nstatic ", "\nif ",
                "\nfor ", "\nwhile ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::Js => &[
                "\nfunction ", "\nconst ", "\nlet ", "\nvar ", "\nclass ", "\nif ", "\nfor ",
                "\nwhile ", "\nswitch ", "\ncase ", "\ndefault ", "\n\n", "\n", " ", "",
            ],
            Language::Kotlin => &[
                "\nclass ", "\nobject ", "\ncompanion ", "\nfun ", "\nval ", "\nvar ", "\nif ",
                "\nfor ", "\nwhile ", "\nwhen ", "\nelse ", "\n\n", "\n", " ", "",
            ],
            Language::Latex => &[
                "\n\\chapter{", "\n\\section{", "\n\\subsection{", "\n\\subsubsection{",
                "\n\\begin{", "\n\n", "\n", " ", "",
            ],
            Language::Lua => &[
                "\nlocal ", "\nfunction ", "\nif ", "\nfor ", "\nwhile ", "\nrepeat ", "\n\n",
                "\n", " ", "",
            ],
            Language::Markdown => &[
                "\n## ", "\n### ", "\n# ", "\n```\n", "\n---\n", "\n***\n", "\n\n", "\n", " ", "",
            ],
            Language::Perl => &[
                "\nsub ", "\npackage ", "\nif ", "\nforeach ", "\nwhile ", "\nunless ", "\n\n",
                "\n", " ", "",
            ],
            Language::Php => &[
                "\nfunction ", "\nclass ", "\nif ", "\nforeach ", "\nwhile ", "\ndo ",
                "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::PowerShell => &[
                "\nfunction ", "\nparam ", "\nclass ", "\nif ", "\nforeach ", "\nfor ",
                "\nwhile ", "\nswitch ", "\ntry ", "\n\n", "\n", " ", "",
            ],
            Language::Proto => &[
                "\nmessage ", "\nservice ", "\nenum ", "\noption ", "\nimport ", "\nsyntax ",
                "\n\n", "\n", " ", "",
            ],
            Language::Python => &["\nclass ", "\ndef ", "\n\tdef ", "\n\n", "\n", " ", ""],
            Language::Rst => &["\n=+\n", "\n-+\n", "\n.. ", "\n\n", "\n", " ", ""],
            Language::Ruby => &[
                "\ndef ", "\nclass ", "\nmodule ", "\nif ", "\nunless ", "\nwhile ", "\nfor ",
                "\nbegin ", "\nrescue ", "\n\n", "\n", " ", "",
            ],
            Language::Rust => &[
                "\nfn ", "\nconst ", "\nlet ", "\nif ", "\nwhile ", "\nfor ", "\nloop ",
                "\nmatch ", "\nimpl ", "\n\n", "\n", " ", "",
            ],
            Language::Scala => &[
                "\nclass ", "\nobject ", "\ndef ", "\nval ", "\nvar ", "\nif ", "\nfor ",
                "\nwhile ", "\nmatch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::Solidity => &[
                "\npragma ", "\nusing ", "\ncontract ", "\ninterface ", "\nlibrary ",
                "\nconstructor ", "\nfunction ", "\nevent ", "\nmodifier ", "\nstruct ",
                "\nenum ", "\nif ", "\nfor ", "\nwhile ", "\n\n", "\n", " ", "",
            ],
            Language::Swift => &[
                "\nfunc ", "\nclass ", "\nstruct ", "\nenum ", "\nextension ", "\nif ",
                "\nfor ", "\nwhile ", "\ndo ", "\nswitch ", "\ncase ", "\n\n", "\n", " ", "",
            ],
            Language::Ts => &[
                "\nenum ", "\ninterface ", "\nnamespace ", "\ntype ", "\nclass ",
                "\nfunction ", "\nconst ", "\nlet ", "\nvar ", "\nif ", "\nfor ", "\nwhile ",
                "\nswitch ", "\ncase ", "\ndefault ", "\n\n", "\n", " ", "",
            ],
        }
    }
}
