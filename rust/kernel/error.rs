// SPDX-License-Identifier: GPL-2.0

//! Kernel errors.
//!
//! Errors are carried as negative errno values, the same way the C side of the driver model
//! reports them, so that a failed transfer on the bus surfaces with the code the bus reported.

use core::fmt;

/// Contains the errno codes used by the driver model.
pub mod code {
    macro_rules! declare_err {
        ($err:tt, $errno:literal, $doc:expr) => {
            #[doc = $doc]
            pub const $err: super::Error = super::Error(-$errno);
        };
    }

    declare_err!(EPERM, 1, "Operation not permitted.");
    declare_err!(ENOENT, 2, "No such file or directory.");
    declare_err!(EIO, 5, "I/O error.");
    declare_err!(ENXIO, 6, "No such device or address.");
    declare_err!(EAGAIN, 11, "Try again.");
    declare_err!(ENOMEM, 12, "Out of memory.");
    declare_err!(EBUSY, 16, "Device or resource busy.");
    declare_err!(EEXIST, 17, "File exists.");
    declare_err!(ENODEV, 19, "No such device.");
    declare_err!(EINVAL, 22, "Invalid argument.");
    declare_err!(ERANGE, 34, "Math result not representable.");
    declare_err!(ENODATA, 61, "No data available.");
    declare_err!(EOVERFLOW, 75, "Value too large for defined data type.");
    declare_err!(EREMOTEIO, 121, "Remote I/O error.");
    declare_err!(ETIMEDOUT, 110, "Connection timed out.");
    declare_err!(EPROBE_DEFER, 517, "Driver requests probe retry.");
    declare_err!(ENOTSUPP, 524, "Operation is not supported.");
}

/// Generic integer kernel error.
///
/// The kernel defines a set of integer generic error codes based on C and POSIX ones. These codes
/// may have a more specific meaning in some contexts.
///
/// # Invariants
///
/// The value is a valid `errno` (i.e. `>= -MAX_ERRNO && < 0`).
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Error(i32);

/// Largest errno value accepted by [`Error::from_errno`].
const MAX_ERRNO: i32 = 4095;

impl Error {
    /// Creates an [`Error`] from a kernel error code.
    ///
    /// It is a bug to pass an out-of-range `errno`. `EINVAL` would be returned in such a case.
    pub fn from_errno(errno: i32) -> Error {
        if !(-MAX_ERRNO..0).contains(&errno) {
            log::warn!("attempted to create an Error with out of range errno: {}", errno);
            return code::EINVAL;
        }

        // INVARIANT: The check above ensures the type invariant will hold.
        Error(errno)
    }

    /// Returns the kernel error code.
    pub fn to_errno(self) -> i32 {
        self.0
    }

    /// Returns the symbolic name of the error code, if it is one of the known codes.
    pub fn name(&self) -> Option<&'static str> {
        let name = match -self.0 {
            1 => "EPERM",
            2 => "ENOENT",
            5 => "EIO",
            6 => "ENXIO",
            11 => "EAGAIN",
            12 => "ENOMEM",
            16 => "EBUSY",
            17 => "EEXIST",
            19 => "ENODEV",
            22 => "EINVAL",
            34 => "ERANGE",
            61 => "ENODATA",
            75 => "EOVERFLOW",
            110 => "ETIMEDOUT",
            121 => "EREMOTEIO",
            517 => "EPROBE_DEFER",
            524 => "ENOTSUPP",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            // Print out number if no name can be found.
            None => f.debug_tuple("Error").field(&-self.0).finish(),
            Some(name) => f.write_str(name),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            None => write!(f, "errno {}", -self.0),
            Some(name) => write!(f, "{} ({})", name, self.0),
        }
    }
}

impl std::error::Error for Error {}

impl From<core::num::TryFromIntError> for Error {
    fn from(_: core::num::TryFromIntError) -> Error {
        code::EINVAL
    }
}

/// A [`Result`] with an [`Error`] error type.
///
/// To be used as the return type for functions that may fail.
pub type Result<T = (), E = Error> = core::result::Result<T, E>;

/// Converts an integer as returned by a C-style bus callback to a [`Result`].
pub fn to_result(err: i32) -> Result {
    if err < 0 {
        Err(Error::from_errno(err))
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{code::*, *};

    #[test]
    fn errno_round_trip() {
        assert_eq!(Error::from_errno(-19), ENODEV);
        assert_eq!(ENODEV.to_errno(), -19);
        assert_eq!(format!("{:?}", ETIMEDOUT), "ETIMEDOUT");
    }

    #[test]
    fn out_of_range_errno_is_einval() {
        assert_eq!(Error::from_errno(5), EINVAL);
        assert_eq!(Error::from_errno(-5000), EINVAL);
    }

    #[test]
    fn to_result_maps_sign() {
        assert!(to_result(0).is_ok());
        assert!(to_result(3).is_ok());
        assert_eq!(to_result(-5), Err(EIO));
    }
}
