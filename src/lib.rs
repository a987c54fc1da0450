//! Ordbase provide a small collection of foundational data-structures
//! and arithmetic primitives for building order-matching engines and
//! other financial applications.
//!
//! Three independent components are exported:
//!
//! * [rbt::Index], a self-balancing ordered multimap keyed by `u128`,
//!   where duplicate values under one key preserve insertion order.
//! * [dll::List] and [dll::MoveList], doubly linked multiset lists with
//!   constant time head/tail insertion and deletion by value. [dll::List]
//!   keeps a secondary value-to-handles index for constant time membership,
//!   [dll::MoveList] carries values that cannot be cloned and trades the
//!   index for linear scans.
//! * [fixed::Fixed64], a fixed-point decimal over `u128` carrying exactly
//!   ten fractional digits, whose results are bounded by `u64::MAX`.
//!
//! Every container owns a node arena, a mapping from `u128` handle to
//! node. Handles are issued from a monotonically increasing counter and
//! never reused for the lifetime of the container.
//!
//! All components are single threaded and synchronous. Mutations take
//! `&mut self`, queries take `&self`; callers that need to share a
//! container across threads wrap it in their own mutual-exclusion
//! primitive.

use std::{error, fmt, result};

// Short form to compose Error values.
//
// Eg: err_at!(KeyNotFound, msg: "missing key {}", key)
//     err_at!(ExceedMax, u64::try_from(value))
//     err_at!(ExceedMax, u64::try_from(value), "narrowing {}", value)
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

pub mod dll;
pub mod fixed;
pub mod rbt;

/// Type alias for Result return type, used by this package.
pub type Result<T> = result::Result<T, Error>;

/// Error variants that can be returned by this package's public API.
///
/// Each variant carries a prefix, mostly a `file:line-no` of where the
/// error happened, and a human readable message.
#[derive(Clone, Debug, PartialEq)]
pub enum Error {
    /// Operation requires a non-empty tree.
    TreeEmpty(String, String),
    /// Operation requires a non-empty list.
    EmptyList(String, String),
    /// Requested key is not present in the container.
    KeyNotFound(String, String),
    /// Requested value is not present in the container.
    ValueNotFound(String, String),
    /// Handle does not resolve to a live node in the arena.
    NodeNotFound(String, String),
    /// List index exceeds the list length.
    IndexOutOfBounds(String, String),
    /// Cursor advanced past the end of iteration.
    MustHaveNext(String, String),
    /// Move-only list torn down while still holding values.
    NonEmptyList(String, String),
    /// Fixed-point result exceeds the domain ceiling.
    ExceedMax(String, String),
    /// More fractional digits requested than the type carries.
    ExceedMaxDecimals(String, String),
    /// Power of ten outside the precomputed table.
    ExceedMaxExp(String, String),
    /// Conversion would silently drop fractional digits.
    PrecisionLoss(String, String),
    /// Rotation attempted on a node without the required child.
    InvalidRotation(String, String),
    /// Double-red repair found the tree in an impossible shape.
    InvalidFixDoubleRed(String, String),
    /// Parent/child edge does not point back where it should.
    InvalidEdgeDirection(String, String),
    /// Invariant violation, call the programmer.
    Fatal(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            TreeEmpty(p, m) => write!(f, "{} TreeEmpty: {}", p, m),
            EmptyList(p, m) => write!(f, "{} EmptyList: {}", p, m),
            KeyNotFound(p, m) => write!(f, "{} KeyNotFound: {}", p, m),
            ValueNotFound(p, m) => write!(f, "{} ValueNotFound: {}", p, m),
            NodeNotFound(p, m) => write!(f, "{} NodeNotFound: {}", p, m),
            IndexOutOfBounds(p, m) => write!(f, "{} IndexOutOfBounds: {}", p, m),
            MustHaveNext(p, m) => write!(f, "{} MustHaveNext: {}", p, m),
            NonEmptyList(p, m) => write!(f, "{} NonEmptyList: {}", p, m),
            ExceedMax(p, m) => write!(f, "{} ExceedMax: {}", p, m),
            ExceedMaxDecimals(p, m) => write!(f, "{} ExceedMaxDecimals: {}", p, m),
            ExceedMaxExp(p, m) => write!(f, "{} ExceedMaxExp: {}", p, m),
            PrecisionLoss(p, m) => write!(f, "{} PrecisionLoss: {}", p, m),
            InvalidRotation(p, m) => write!(f, "{} InvalidRotation: {}", p, m),
            InvalidFixDoubleRed(p, m) => write!(f, "{} InvalidFixDoubleRed: {}", p, m),
            InvalidEdgeDirection(p, m) => write!(f, "{} InvalidEdgeDirection: {}", p, m),
            Fatal(p, m) => write!(f, "{} Fatal: {}", p, m),
        }
    }
}

impl error::Error for Error {}
