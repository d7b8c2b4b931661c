//! go-import meta document template
//!
//! The document text is parsed once into literal and field segments. Rendering
//! walks the segments into a fresh buffer, so a parsed template can be shared
//! read-only by every request.

use std::fmt::Write;

use super::PackageDescriptor;
use crate::error::TemplateError;

/// Document served to package tools
pub const META_DOCUMENT: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta http-equiv="Content-Type" content="text/html; charset=utf-8"/>
<meta name="go-import" content="{{package}} {{vcs}} {{remote}}"/>
</head>
</html>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Package,
    Vcs,
    Remote,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name.trim() {
            "package" => Some(Self::Package),
            "vcs" => Some(Self::Vcs),
            "remote" => Some(Self::Remote),
            _ => None,
        }
    }

    fn value(self, descriptor: &PackageDescriptor) -> &str {
        match self {
            Self::Package => &descriptor.import_path,
            Self::Vcs => &descriptor.vcs,
            Self::Remote => &descriptor.remote,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(Field),
}

/// Parsed, immutable meta template
#[derive(Debug, Clone)]
pub struct MetaTemplate {
    segments: Vec<Segment>,
}

impl MetaTemplate {
    /// Parse template text with `{{package}}`, `{{vcs}}` and `{{remote}}` placeholders
    pub fn parse(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = text;
        let mut offset = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or(TemplateError::Unterminated {
                offset: offset + start,
            })?;
            let name = &after[..end];
            let field = Field::from_name(name).ok_or_else(|| TemplateError::UnknownField {
                name: name.trim().to_string(),
            })?;
            segments.push(Segment::Field(field));

            let consumed = start + 2 + end + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    /// The built-in go-import document
    pub fn go_import() -> Result<Self, TemplateError> {
        Self::parse(META_DOCUMENT)
    }

    /// Render the document for one package; field values are attribute-escaped
    pub fn render(&self, descriptor: &PackageDescriptor) -> Result<String, TemplateError> {
        let mut out = String::with_capacity(META_DOCUMENT.len() + 128);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(field) => write!(out, "{}", escape_attr(field.value(descriptor)))?,
            }
        }
        Ok(out)
    }
}

/// Escape a value for use inside a double- or single-quoted HTML attribute
pub fn escape_attr(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&#34;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(pkg: &str) -> PackageDescriptor {
        PackageDescriptor {
            import_path: format!("go.kendal.io/{pkg}"),
            vcs: "git".to_string(),
            remote: format!("https://github.com/kharland/{pkg}"),
        }
    }

    #[test]
    fn test_render_go_import() {
        let tmpl = MetaTemplate::go_import().unwrap();
        let html = tmpl.render(&descriptor("widget")).unwrap();
        assert_eq!(
            html,
            "<!DOCTYPE html>\n<html>\n<head>\n\
             <meta http-equiv=\"Content-Type\" content=\"text/html; charset=utf-8\"/>\n\
             <meta name=\"go-import\" content=\"go.kendal.io/widget git https://github.com/kharland/widget\"/>\n\
             </head>\n</html>\n"
        );
    }

    #[test]
    fn test_render_empty_package() {
        let tmpl = MetaTemplate::go_import().unwrap();
        let html = tmpl.render(&descriptor("")).unwrap();
        assert!(html.contains(
            r#"content="go.kendal.io/ git https://github.com/kharland/""#
        ));
    }

    #[test]
    fn test_render_escapes_values() {
        let tmpl = MetaTemplate::go_import().unwrap();
        let html = tmpl.render(&descriptor("a\"><script>")).unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("a&#34;&gt;&lt;script&gt;"));
    }

    #[test]
    fn test_parse_errors() {
        assert!(matches!(
            MetaTemplate::parse("abc {{package"),
            Err(TemplateError::Unterminated { offset: 4 })
        ));
        assert!(matches!(
            MetaTemplate::parse("{{package}} {{branch}}"),
            Err(TemplateError::UnknownField { name }) if name == "branch"
        ));
    }

    #[test]
    fn test_parse_without_placeholders() {
        let tmpl = MetaTemplate::parse("static").unwrap();
        assert_eq!(tmpl.render(&descriptor("x")).unwrap(), "static");
    }

    #[test]
    fn test_escape_attr() {
        assert_eq!(escape_attr("plain/path"), "plain/path");
        assert_eq!(escape_attr("a&b'c"), "a&amp;b&#39;c");
    }
}
