//! crates/logging/src/classifier.rs
//! Decides whether a stack frame belongs to application code.
//!
//! Classification is an ordered table of [`FrameRule`]s evaluated against a
//! frame and a [`PrefixSet`] snapshot. The first matching rule wins. Every rule
//! can also be evaluated on its own through [`FrameRule::matches`], which keeps
//! the individual heuristics testable.
//!
//! Path rules compare separators loosely (`/` and `\` are equivalent) and let a
//! `_` in a registered crate name match the `-` cargo uses in package
//! directories, so `my_crate` matches both `/my_crate/` and `/my-crate-1.2.0/`.

use crate::frame::{Frame, basename};
use crate::registry::PrefixSet;

/// How the resolver treats testing-framework frames.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
pub enum ResolveMode {
    /// Harness frames are ordinary frames.
    #[default]
    Standard,
    /// Harness frames are skipped and test sources are always attributable.
    TestAware,
}

impl ResolveMode {
    /// Returns `true` for [`ResolveMode::TestAware`].
    #[must_use]
    pub const fn is_test_aware(self) -> bool {
        matches!(self, Self::TestAware)
    }
}

/// One internal-frame heuristic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum FrameRule {
    /// Unsymbolized frames, the unwinder, and the Rust runtime.
    Runtime,
    /// Demangled function path starts with a registered prefix.
    FunctionPrefix,
    /// Source path contains `/prefix/`. Host-registered prefixes only.
    PathSegment,
    /// Source path contains `/prefix@version/` or `/prefix-<version>/`.
    VersionedPathSegment,
    /// Source path is relative and starts with the short package name.
    /// Host-registered prefixes only.
    RelativePackagePath,
}

impl FrameRule {
    /// Rules in evaluation order.
    pub const ORDERED: [Self; 5] = [
        Self::Runtime,
        Self::FunctionPrefix,
        Self::PathSegment,
        Self::VersionedPathSegment,
        Self::RelativePackagePath,
    ];

    /// Evaluates this rule alone.
    #[must_use]
    pub fn matches(self, frame: &Frame, prefixes: &PrefixSet) -> bool {
        match self {
            Self::Runtime => is_runtime_frame(frame),
            Self::FunctionPrefix => prefixes
                .iter()
                .any(|prefix| starts_with_path(&frame.function, prefix)),
            Self::PathSegment => prefixes
                .registered()
                .any(|prefix| path_has_package(&frame.file, prefix, SegmentKind::Plain)),
            Self::VersionedPathSegment => prefixes
                .iter()
                .any(|prefix| path_has_package(&frame.file, prefix, SegmentKind::Versioned)),
            Self::RelativePackagePath => {
                is_relative(&frame.file)
                    && prefixes
                        .registered()
                        .any(|prefix| relative_starts_with(&frame.file, short_name(prefix)))
            }
        }
    }

    /// Short identifier used in diagnostics.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Runtime => "runtime",
            Self::FunctionPrefix => "function-prefix",
            Self::PathSegment => "path-segment",
            Self::VersionedPathSegment => "versioned-path-segment",
            Self::RelativePackagePath => "relative-package-path",
        }
    }
}

/// Outcome of classifying one frame.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FrameClass {
    /// Platform runtime or unwinder frame.
    Runtime,
    /// Testing-framework frame; only produced in [`ResolveMode::TestAware`].
    TestHarness,
    /// Frame inside a registered package, with the rule that matched.
    Internal(FrameRule),
    /// Application frame.
    External,
}

impl FrameClass {
    /// Reports whether the frame may be reported as the caller.
    #[must_use]
    pub const fn is_external(self) -> bool {
        matches!(self, Self::External)
    }
}

/// Classifies `frame` against `prefixes`.
#[must_use]
pub fn classify(frame: &Frame, prefixes: &PrefixSet, mode: ResolveMode) -> FrameClass {
    if mode.is_test_aware() && is_test_harness_frame(frame) {
        return FrameClass::TestHarness;
    }
    for rule in FrameRule::ORDERED {
        if rule.matches(frame, prefixes) {
            return match rule {
                FrameRule::Runtime => FrameClass::Runtime,
                rule => FrameClass::Internal(rule),
            };
        }
    }
    FrameClass::External
}

/// Reports whether `frame` must never be reported as the caller.
#[must_use]
pub fn is_internal(frame: &Frame, prefixes: &PrefixSet) -> bool {
    !classify(frame, prefixes, ResolveMode::Standard).is_external()
}

/// Crate paths of the Rust runtime and the unwinder.
const RUNTIME_CRATES: &[&str] = &[
    "std",
    "core",
    "alloc",
    "backtrace",
    "panic_unwind",
    "panic_abort",
];

/// Symbol prefixes of compiler and platform glue.
const RUNTIME_SYMBOL_PREFIXES: &[&str] = &[
    "__rust",
    "rust_begin_unwind",
    "_Unwind",
    "__libc_start",
    "__scrt_common_main",
    "BaseThreadInitThunk",
    "RtlUserThreadStart",
];

/// Process and thread entry trampolines.
const RUNTIME_ENTRY_POINTS: &[&str] = &[
    "main",
    "_start",
    "start_thread",
    "thread_start",
    "clone",
    "clone3",
    "__clone",
    "mainCRTStartup",
];

const RUNTIME_SOURCE_DIRS: &[&str] = &[
    "/library/std/",
    "/library/core/",
    "/library/alloc/",
    "/library/panic_unwind/",
    "/library/panic_abort/",
    "/library/backtrace/",
];

const HARNESS_SOURCE_DIR: &str = "/library/test/";

/// Reports whether `frame` belongs to the runtime or the unwinder.
#[must_use]
pub fn is_runtime_frame(frame: &Frame) -> bool {
    if frame.is_unresolved() {
        return true;
    }
    let function = symbol_head(&frame.function);
    if RUNTIME_CRATES
        .iter()
        .any(|krate| starts_with_path(function, krate))
        || RUNTIME_SYMBOL_PREFIXES
            .iter()
            .any(|prefix| function.starts_with(prefix))
        || RUNTIME_ENTRY_POINTS.contains(&function)
    {
        return true;
    }
    RUNTIME_SOURCE_DIRS
        .iter()
        .any(|dir| contains_path(&frame.file, dir))
}

/// Reports whether `frame` belongs to the libtest harness.
#[must_use]
pub fn is_test_harness_frame(frame: &Frame) -> bool {
    starts_with_path(&frame.function, "test") || contains_path(&frame.file, HARNESS_SOURCE_DIR)
}

/// Reports whether `frame` comes from test code.
///
/// Test code lives in a `tests/` directory, in `tests.rs` or `*_test.rs`
/// files, or in a `tests` module.
#[must_use]
pub fn is_test_source(frame: &Frame) -> bool {
    let name = basename(&frame.file);
    contains_path(&frame.file, "/tests/")
        || relative_starts_with(&frame.file, "tests")
        || name == "tests.rs"
        || name.ends_with("_test.rs")
        || name.ends_with("_tests.rs")
        || frame.function.contains("::tests::")
        || frame.function.ends_with("::tests")
}

/// Strips the `<` that opens trait-impl symbols such as `<a::B as c::D>::f`.
fn symbol_head(function: &str) -> &str {
    function.trim_start_matches('<')
}

/// Reports whether `function` starts with the path `prefix` on an
/// identifier boundary, so `app` matches `app::run` and `app<T>` but not
/// `apple::run`.
fn starts_with_path(function: &str, prefix: &str) -> bool {
    let Some(rest) = symbol_head(function).strip_prefix(prefix) else {
        return false;
    };
    rest.chars()
        .next()
        .is_none_or(|next| !(next.is_alphanumeric() || next == '_'))
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SegmentKind {
    Plain,
    Versioned,
}

fn is_separator(byte: u8) -> bool {
    byte == b'/' || byte == b'\\'
}

/// Matches the package path `prefix` at `start` in `path`.
///
/// `::` in the prefix matches one separator and `_` also matches `-`. Returns
/// the index just past the match.
fn match_package_at(path: &[u8], start: usize, prefix: &[u8]) -> Option<usize> {
    let mut at = start;
    let mut idx = 0;
    while idx < prefix.len() {
        let found = *path.get(at)?;
        if prefix[idx..].starts_with(b"::") {
            if !is_separator(found) {
                return None;
            }
            idx += 2;
        } else {
            let wanted = prefix[idx];
            let same = found == wanted
                || (wanted == b'_' && found == b'-')
                || (is_separator(wanted) && is_separator(found));
            if !same {
                return None;
            }
            idx += 1;
        }
        at += 1;
    }
    Some(at)
}

/// Classifies what follows a package name in a path.
fn segment_after(rest: &[u8]) -> Option<SegmentKind> {
    let (&first, tail) = rest.split_first()?;
    if is_separator(first) {
        return Some(SegmentKind::Plain);
    }
    let version_len = tail.iter().position(|&byte| is_separator(byte))?;
    match first {
        b'@' if version_len > 0 => Some(SegmentKind::Versioned),
        b'-' if tail.first().is_some_and(u8::is_ascii_digit)
            && tail[..version_len]
                .iter()
                .all(|&byte| byte.is_ascii_alphanumeric() || b".+-_".contains(&byte)) =>
        {
            Some(SegmentKind::Versioned)
        }
        _ => None,
    }
}

/// Reports whether `file` has a directory for package `prefix` of the given kind.
fn path_has_package(file: &str, prefix: &str, kind: SegmentKind) -> bool {
    let path = file.as_bytes();
    let prefix = prefix.as_bytes();
    if prefix.is_empty() {
        return false;
    }
    path.iter()
        .enumerate()
        .filter(|(_, byte)| is_separator(**byte))
        .any(|(sep, _)| {
            match_package_at(path, sep + 1, prefix)
                .and_then(|end| segment_after(&path[end..]))
                == Some(kind)
        })
}

fn is_relative(file: &str) -> bool {
    let bytes = file.as_bytes();
    match bytes {
        [] => false,
        [first, ..] if is_separator(*first) => false,
        [drive, b':', ..] if drive.is_ascii_alphabetic() => false,
        _ => true,
    }
}

fn relative_starts_with(file: &str, name: &str) -> bool {
    if name.is_empty() || !is_relative(file) {
        return false;
    }
    let path = file.as_bytes();
    match_package_at(path, 0, name.as_bytes())
        .and_then(|end| path.get(end))
        .is_some_and(|byte| is_separator(*byte))
}

/// Last segment of a module path or slash-separated package path.
fn short_name(prefix: &str) -> &str {
    let tail = prefix.rsplit("::").next().unwrap_or(prefix);
    tail.rsplit('/').next().unwrap_or(tail)
}

/// Substring search that treats `/` and `\` as the same byte.
fn contains_path(haystack: &str, needle: &str) -> bool {
    let haystack = haystack.as_bytes();
    let needle = needle.as_bytes();
    if needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|window| {
        window
            .iter()
            .zip(needle)
            .all(|(a, b)| a == b || (is_separator(*a) && is_separator(*b)))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prefixes(list: &[&str]) -> PrefixSet {
        PrefixSet::from_prefixes(list.iter().copied())
    }

    fn frame(function: &str, file: &str) -> Frame {
        Frame::new(function, file, 10)
    }

    #[test]
    fn unresolved_frames_are_runtime() {
        let set = prefixes(&[]);
        assert!(FrameRule::Runtime.matches(&Frame::default(), &set));
    }

    #[test]
    fn runtime_rule_covers_std_and_trampolines() {
        let set = prefixes(&[]);
        for function in [
            "std::rt::lang_start_internal",
            "core::ops::function::FnOnce::call_once",
            "<alloc::boxed::Box<F,A> as core::ops::function::FnOnce<Args>>::call_once",
            "backtrace::backtrace::trace",
            "__rust_begin_short_backtrace",
            "__libc_start_main",
            "main",
            "_start",
        ] {
            assert!(
                FrameRule::Runtime.matches(&frame(function, "/src/x.rs"), &set),
                "{function} should be runtime"
            );
        }
        let from_library = frame("?", "/rustc/abc/library/std/src/rt.rs");
        assert!(FrameRule::Runtime.matches(&from_library, &set));
    }

    #[test]
    fn runtime_rule_respects_identifier_boundaries() {
        let set = prefixes(&[]);
        assert!(!FrameRule::Runtime.matches(&frame("stdio_tool::main", "/w/src/main.rs"), &set));
        assert!(!FrameRule::Runtime.matches(&frame("corelib_app::run", "/w/src/lib.rs"), &set));
        assert!(!FrameRule::Runtime.matches(&frame("app::main", "/w/src/main.rs"), &set));
    }

    #[test]
    fn function_prefix_matches_on_path_boundary() {
        let set = prefixes(&["app::wrapper"]);
        let rule = FrameRule::FunctionPrefix;
        assert!(rule.matches(&frame("app::wrapper::log", ""), &set));
        assert!(rule.matches(&frame("app::wrapper", ""), &set));
        assert!(rule.matches(&frame("<app::wrapper::Sink as x::Y>::write", ""), &set));
        assert!(!rule.matches(&frame("app::wrapper_two::log", ""), &set));
        assert!(!rule.matches(&frame("app::run", ""), &set));
    }

    #[test]
    fn function_prefix_handles_slash_paths() {
        let set = prefixes(&["github.com/test/wrapper"]);
        let hit = frame("github.com/test/wrapper.(*Logger).Info", "");
        assert!(FrameRule::FunctionPrefix.matches(&hit, &set));
    }

    #[test]
    fn path_segment_matches_directory() {
        let set = prefixes(&["my_crate"]);
        let rule = FrameRule::PathSegment;
        assert!(rule.matches(&frame("", "/work/my_crate/src/lib.rs"), &set));
        assert!(rule.matches(&frame("", "/work/my-crate/src/lib.rs"), &set));
        assert!(rule.matches(&frame("", "C:\\work\\my_crate\\src\\lib.rs"), &set));
        assert!(!rule.matches(&frame("", "/work/my_crate_ext/src/lib.rs"), &set));
        assert!(!rule.matches(&frame("", "/work/src/my_crate.rs"), &set));
    }

    #[test]
    fn path_segment_renders_module_paths_as_directories() {
        let set = prefixes(&["app::adapters"]);
        let hit = frame("", "/srv/app/adapters/http.rs");
        assert!(FrameRule::PathSegment.matches(&hit, &set));
    }

    #[test]
    fn versioned_path_segment_matches_at_and_cargo_forms() {
        let set = prefixes(&["github.com/test/wrapper", "serde_json"]);
        let rule = FrameRule::VersionedPathSegment;
        let at_form = frame("", "/go/pkg/mod/github.com/test/wrapper@v1.2.3/log.go");
        let cargo_form = frame(
            "",
            "/home/u/.cargo/registry/src/index.crates.io-6f17d22bba15001f/serde_json-1.0.120/src/de.rs",
        );
        assert!(rule.matches(&at_form, &set));
        assert!(rule.matches(&cargo_form, &set));
        assert!(!rule.matches(&frame("", "/go/pkg/mod/github.com/test/wrapper/log.go"), &set));
        assert!(!rule.matches(&frame("", "/src/serde_json-extras/lib.rs"), &set));
    }

    #[test]
    fn unversioned_rule_ignores_versioned_dirs_and_vice_versa() {
        let set = prefixes(&["wrapper"]);
        let versioned = frame("", "/mod/wrapper@v2/log.go");
        let plain = frame("", "/mod/wrapper/log.go");
        assert!(!FrameRule::PathSegment.matches(&versioned, &set));
        assert!(FrameRule::VersionedPathSegment.matches(&versioned, &set));
        assert!(FrameRule::PathSegment.matches(&plain, &set));
        assert!(!FrameRule::VersionedPathSegment.matches(&plain, &set));
    }

    #[test]
    fn relative_package_path_uses_short_name() {
        let set = prefixes(&["github.com/test/wrapper", "app::adapters"]);
        let rule = FrameRule::RelativePackagePath;
        assert!(rule.matches(&frame("", "wrapper/log.go"), &set));
        assert!(rule.matches(&frame("", "adapters/http.rs"), &set));
        assert!(!rule.matches(&frame("", "/abs/wrapper/log.go"), &set));
        assert!(!rule.matches(&frame("", "wrappers/log.go"), &set));
    }

    #[test]
    fn classify_returns_first_matching_rule() {
        let set = prefixes(&["app::wrapper"]);
        let both = frame("app::wrapper::log", "/srv/app/wrapper/log.rs");
        assert_eq!(
            classify(&both, &set, ResolveMode::Standard),
            FrameClass::Internal(FrameRule::FunctionPrefix)
        );
        let by_path = frame("", "/srv/app/wrapper/log.rs");
        assert_eq!(
            classify(&by_path, &set, ResolveMode::Standard),
            FrameClass::Internal(FrameRule::PathSegment)
        );
        let runtime = frame("std::thread::spawn", "/srv/app/wrapper/log.rs");
        assert_eq!(
            classify(&runtime, &set, ResolveMode::Standard),
            FrameClass::Runtime
        );
    }

    #[test]
    fn application_frames_are_external() {
        let set = prefixes(&["logging", "app::wrapper"]);
        let app = frame("app::handlers::login", "/srv/app/src/handlers.rs");
        assert_eq!(
            classify(&app, &set, ResolveMode::Standard),
            FrameClass::External
        );
        assert!(!is_internal(&app, &set));
    }

    #[test]
    fn seeded_defaults_ignore_application_directories() {
        let set = crate::registry::InternalPackages::with_defaults().snapshot();
        for (function, file) in [
            ("myapp::logging::init", "/home/u/myapp/src/logging/mod.rs"),
            ("myapp::tracing::setup", "/home/u/myapp/src/tracing/mod.rs"),
            ("myapp::main", "/home/u/sitelog/src/main.rs"),
            ("myapp::run", "logging/src/run.rs"),
        ] {
            assert_eq!(
                classify(&frame(function, file), &set, ResolveMode::Standard),
                FrameClass::External,
                "{file} must stay external"
            );
        }
    }

    #[test]
    fn seeded_defaults_match_functions_and_dependency_dirs() {
        let set = crate::registry::InternalPackages::with_defaults().snapshot();
        let by_function = frame("tracing_core::dispatcher::get_default", "/w/src/x.rs");
        assert_eq!(
            classify(&by_function, &set, ResolveMode::Standard),
            FrameClass::Internal(FrameRule::FunctionPrefix)
        );
        let by_dependency = frame(
            "",
            "/home/u/.cargo/registry/src/index.crates.io-1/tracing-subscriber-0.3.19/src/layer.rs",
        );
        assert_eq!(
            classify(&by_dependency, &set, ResolveMode::Standard),
            FrameClass::Internal(FrameRule::VersionedPathSegment)
        );
    }

    #[test]
    fn registered_prefixes_keep_plain_path_matching() {
        let registry = crate::registry::InternalPackages::with_defaults();
        registry.register(["adapters"]);
        let set = registry.snapshot();
        let adapter = frame("", "/home/u/myapp/adapters/log.rs");
        assert_eq!(
            classify(&adapter, &set, ResolveMode::Standard),
            FrameClass::Internal(FrameRule::PathSegment)
        );
    }

    #[test]
    fn harness_frames_only_recognised_in_test_aware_mode() {
        let set = prefixes(&[]);
        let harness = frame("test::run_test::{{closure}}", "/rustc/x/library/test/src/lib.rs");
        assert_eq!(
            classify(&harness, &set, ResolveMode::Standard),
            FrameClass::External
        );
        assert_eq!(
            classify(&harness, &set, ResolveMode::TestAware),
            FrameClass::TestHarness
        );
    }

    #[test]
    fn test_sources_are_recognised() {
        assert!(is_test_source(&frame("", "/w/crates/logging/tests/caller.rs")));
        assert!(is_test_source(&frame("", "/w/src/line_mode/tests.rs")));
        assert!(is_test_source(&frame("", "/w/src/wrapper_test.rs")));
        assert!(is_test_source(&frame("logging::filter::tests::scenario", "/w/src/filter.rs")));
        assert!(!is_test_source(&frame("logging::filter::apply", "/w/src/filter.rs")));
    }

    #[test]
    fn contains_path_is_separator_agnostic() {
        assert!(contains_path("C:\\rustc\\library\\std\\src\\rt.rs", "/library/std/"));
        assert!(!contains_path("/lib", "/library/std/"));
    }
}
