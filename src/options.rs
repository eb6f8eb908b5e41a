//! Optional arguments of `hivex_open` and their translation to engine flags.

use bitflags::bitflags;

bitflags! {
    /// Presence bitmask for the optional arguments of `hivex_open`.
    ///
    /// A bit is set only when the caller actually supplied that argument.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OptArgs: u64 {
        /// `verbose` was supplied.
        const VERBOSE = 1 << 0;
        /// `debug` was supplied.
        const DEBUG = 1 << 1;
        /// `write` was supplied.
        const WRITE = 1 << 2;
    }
}

bitflags! {
    /// Flags passed to the engine when opening a hive.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct OpenFlags: u32 {
        /// Print messages while processing the hive.
        const VERBOSE = 0x01;
        /// Very verbose engine debugging.
        const DEBUG = 0x02;
        /// Allow modifications and `commit`.
        const WRITE = 0x04;
    }
}

impl Default for OptArgs {
    fn default() -> Self {
        Self::empty()
    }
}

/// Optional arguments of `hivex_open` as received from the caller.
///
/// The booleans are only meaningful for arguments marked in `present`. An
/// argument that was not supplied never reaches the engine, whatever its
/// boolean happens to hold.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenOptions {
    /// Which arguments were supplied.
    pub present: OptArgs,
    /// Value of `verbose`.
    pub verbose: bool,
    /// Value of `debug`.
    pub debug: bool,
    /// Value of `write`.
    pub write: bool,
}

impl OpenOptions {
    /// Options with nothing supplied: a plain read-only open.
    pub fn new() -> Self {
        Self::default()
    }

    /// Supplies `verbose`.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.present |= OptArgs::VERBOSE;
        self.verbose = verbose;
        self
    }

    /// Supplies `debug`.
    pub fn debug(mut self, debug: bool) -> Self {
        self.present |= OptArgs::DEBUG;
        self.debug = debug;
        self
    }

    /// Supplies `write`.
    pub fn write(mut self, write: bool) -> Self {
        self.present |= OptArgs::WRITE;
        self.write = write;
        self
    }

    /// Rebuilds options from a raw wire bitmask. Unknown bits are ignored.
    pub fn from_wire(bitmask: u64, verbose: bool, debug: bool, write: bool) -> Self {
        Self {
            present: OptArgs::from_bits_truncate(bitmask),
            verbose,
            debug,
            write,
        }
    }

    /// Computes the engine flags: an argument contributes its flag only if
    /// it is both present and true.
    pub fn engine_flags(&self) -> OpenFlags {
        let mut flags = OpenFlags::empty();
        if self.present.contains(OptArgs::VERBOSE) && self.verbose {
            flags |= OpenFlags::VERBOSE;
        }
        if self.present.contains(OptArgs::DEBUG) && self.debug {
            flags |= OpenFlags::DEBUG;
        }
        if self.present.contains(OptArgs::WRITE) && self.write {
            flags |= OpenFlags::WRITE;
        }
        flags
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_only() {
        let opts = OpenOptions::new().write(true);
        assert_eq!(opts.engine_flags(), OpenFlags::WRITE);
    }

    #[test]
    fn test_absent_arguments_are_ignored() {
        let opts = OpenOptions {
            present: OptArgs::empty(),
            verbose: true,
            debug: true,
            write: true,
        };
        assert!(opts.engine_flags().is_empty());
    }

    #[test]
    fn test_present_but_false() {
        let opts = OpenOptions::new().verbose(false).debug(true);
        assert_eq!(opts.engine_flags(), OpenFlags::DEBUG);
    }

    #[test]
    fn test_from_wire_truncates_unknown_bits() {
        let opts = OpenOptions::from_wire(0xff, true, false, true);
        assert_eq!(opts.present, OptArgs::all());
        assert_eq!(opts.engine_flags(), OpenFlags::VERBOSE | OpenFlags::WRITE);
    }
}
