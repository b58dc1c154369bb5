//===- lib.rs -------------------------------------------------------------===//
//
// Finds Itanium C++ ABI mangled names (`_Z...`) in arbitrary text and
// replaces them with their demangled signatures.
//
// The demangling itself is done by `cpp_demangle`; this crate owns the
// scanning, the failure taxonomy and the line-oriented filtering.
//
//===----------------------------------------------------------------------===//

#[macro_use]
extern crate bitflags;

use std::result;

use cpp_demangle::{DemangleOptions, Symbol};

mod filter;
mod scanner;

pub use filter::{filter_lines, FilterStats};
pub use scanner::{LineScanner, Segment};

/// Why a candidate could not be demangled.
///
/// The four kinds are exhaustive and mutually exclusive. While scanning
/// text they are all treated the same way; only single-symbol mode tells
/// them apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum Error {
    #[error("out of memory")]
    OutOfMemory,
    #[error("invalid mangled name")]
    InvalidName,
    #[error("invalid argument")]
    InvalidArg,
    #[error("unknown demangling failure")]
    Unknown,
}

impl Error {
    /// The fixed text printed instead of a name when a single symbol fails.
    pub fn placeholder(self) -> &'static str {
        match self {
            Error::OutOfMemory => "<out of memory>",
            Error::InvalidName => "<invalid name>",
            Error::InvalidArg => "<invalid arg>",
            Error::Unknown => "<???>",
        }
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Process exit statuses of the `demangle` binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    Help = 1,
    OutOfMemory = 2,
    InvalidName = 3,
    InvalidArg = 4,
    OtherFailure = 5,
    NoInputFile = 6,
    NoOutputFile = 7,
    IoFailure = 8,
}

impl ExitCode {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<Error> for ExitCode {
    fn from(err: Error) -> ExitCode {
        match err {
            Error::OutOfMemory => ExitCode::OutOfMemory,
            Error::InvalidName => ExitCode::InvalidName,
            Error::InvalidArg => ExitCode::InvalidArg,
            Error::Unknown => ExitCode::OtherFailure,
        }
    }
}

bitflags! {
    /// Rendering options for successfully demangled names.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DemangleFlags: u32 {
        const COMPLETE                      = 0b00000000;
        /// Leave out the function parameter list.
        const NO_PARAMS                     = 0b00000001;
        /// Leave out the return type of template functions.
        const NO_RETURN_TYPE                = 0b00000010;
        /// Print `1` rather than `(int)1` for literals in template args.
        const HIDE_EXPRESSION_LITERAL_TYPES = 0b00000100;
    }
}

impl DemangleFlags {
    fn options(self) -> DemangleOptions {
        let mut options = DemangleOptions::new();
        if self.contains(DemangleFlags::NO_PARAMS) {
            options = options.no_params();
        }
        if self.contains(DemangleFlags::NO_RETURN_TYPE) {
            options = options.no_return_type();
        }
        if self.contains(DemangleFlags::HIDE_EXPRESSION_LITERAL_TYPES) {
            options = options.hide_expression_literal_types();
        }
        options
    }
}

/// Turns one candidate string into a human readable name.
///
/// Implementations must be pure: the same input always gives the same
/// result, so callers never retry. Any `Fn(&str) -> Result<String>` is a
/// `Demangler`, which keeps scanner tests independent of a real demangler.
pub trait Demangler {
    fn demangle(&self, candidate: &str) -> Result<String>;
}

impl<F> Demangler for F
where
    F: Fn(&str) -> Result<String>,
{
    fn demangle(&self, candidate: &str) -> Result<String> {
        self(candidate)
    }
}

/// The platform C++ ABI demangler, backed by `cpp_demangle`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ItaniumDemangler {
    flags: DemangleFlags,
}

impl ItaniumDemangler {
    pub fn new(flags: DemangleFlags) -> ItaniumDemangler {
        ItaniumDemangler { flags }
    }

    pub fn flags(&self) -> DemangleFlags {
        self.flags
    }
}

impl Demangler for ItaniumDemangler {
    fn demangle(&self, candidate: &str) -> Result<String> {
        // Nothing to parse; a C string demangler can't even see past a NUL.
        if candidate.is_empty() || candidate.contains('\0') {
            return Err(Error::InvalidArg);
        }

        let symbol = Symbol::new(candidate.as_bytes()).map_err(|err| match err {
            cpp_demangle::error::Error::TooMuchRecursion => Error::OutOfMemory,
            _ => Error::InvalidName,
        })?;
        let rendered = symbol
            .demangle(&self.flags.options())
            .map_err(|_| Error::Unknown)?;
        Ok(special_name(candidate, rendered))
    }
}

// `cpp_demangle` prints vtables and thunks as `{vtable(T)}` or
// `{virtual override thunk({offset(N)}, E)}`. Rewrite those into the
// `vtable for T` / `non-virtual thunk to E` forms the C++ runtime uses.
// Anything not in that shape is returned unchanged.
fn special_name(candidate: &str, rendered: String) -> String {
    let inner = |prefix: &str| {
        rendered
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(")}"))
    };

    let prefix = candidate.get(..4).unwrap_or("");
    let (label, inner) = match prefix {
        "_ZTV" => ("vtable for ", inner("{vtable(")),
        "_ZTT" => ("VTT for ", inner("{vtt(")),
        "_ZTh" => ("non-virtual thunk to ", inner("{virtual override thunk(")),
        "_ZTv" => ("virtual thunk to ", inner("{virtual override thunk(")),
        "_ZTc" => ("covariant return thunk to ", inner("{virtual override thunk(")),
        _ => return rendered,
    };
    let Some(mut inner) = inner else {
        return rendered;
    };

    // thunks lead with one or two `{...}` call offsets
    while inner.starts_with('{') {
        let Some(end) = inner.find('}') else {
            return rendered;
        };
        inner = inner[end + 1..].trim_start_matches(", ");
    }
    format!("{}{}", label, inner)
}

/// Demangles exactly one symbol. The whole input must be the mangled name.
pub fn demangle(input: &str, flags: DemangleFlags) -> Result<String> {
    ItaniumDemangler::new(flags).demangle(input)
}

/// Replaces every mangled name embedded in `line` with its demangled form.
///
/// Demangled names are wrapped in `[` `]` when `brackets` is set. Candidates
/// that fail to demangle are left as they were.
pub fn scan(line: &str, brackets: bool) -> String {
    LineScanner::new(ItaniumDemangler::default()).scan(line, brackets)
}
