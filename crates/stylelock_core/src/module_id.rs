use log::trace;

use crate::dialect::Dialect;

/// Identity of a stylesheet module extracted from an opaque module id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Canonical file identity used for parsing and reporting.
    pub filename: String,
    pub dialect: Dialect,
    /// Scoped style blocks are confined to their owning component and are
    /// skipped entirely by the checker.
    pub scoped: bool,
}

/// Resolve an opaque module identifier to a stylesheet module.
///
/// A module id is either a plain path ending in one of `suffixes`, or a
/// single-file-component style block: a `.vue` path whose query carries
/// `type=style`, with an optional trailing `lang.<ext>` marker naming the
/// dialect of the extension-less block. Anything else is not a stylesheet
/// module.
pub fn parse_module_id(id: &str, suffixes: &[String]) -> Option<ModuleInfo> {
    let (path, query) = match id.split_once('?') {
        Some((path, query)) => (path, query),
        None => (id, ""),
    };

    let params: Vec<(&str, &str)> = query
        .split('&')
        .filter(|p| !p.is_empty())
        .map(|p| p.split_once('=').unwrap_or((p, "")))
        .collect();

    let is_style_file = suffixes.iter().any(|suffix| path.ends_with(suffix.as_str()));
    let is_vue_style = path.ends_with(".vue")
        && params.iter().any(|(k, v)| *k == "type" && *v == "style");

    if !is_style_file && !is_vue_style {
        return None;
    }

    let scoped = params.iter().any(|(k, v)| *k == "scoped" && *v == "true");

    if is_vue_style {
        // The block itself has no extension; vue-loader appends a bare
        // `lang.<ext>` marker to the query.
        let lang = params
            .iter()
            .find_map(|(k, _)| k.strip_prefix("lang."))
            .unwrap_or("css");
        let dialect = Dialect::from_extension(lang).unwrap_or(Dialect::Css);
        let filename = format!("{}.{}", path, lang);
        trace!("Module id '{}' is a vue style block: {}", id, filename);
        return Some(ModuleInfo { filename, dialect, scoped });
    }

    let dialect = path
        .rsplit_once('.')
        .and_then(|(_, ext)| Dialect::from_extension(ext))
        .unwrap_or(Dialect::Css);
    Some(ModuleInfo { filename: path.to_string(), dialect, scoped })
}
