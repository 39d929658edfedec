pub const REQUEST: usize = 50;
pub const VALUE_DESCRIPTION: usize = 50;
pub const END: usize = 50;

pub const REAL_VALUE: usize = 16;
pub const COMPLEX_VALUE: usize = 26;

/// Bytes of a value packet up to and including its sign-info byte,
/// enough to discriminate the real and complex forms.
pub const VALUE_HEADER: usize = 14;

/// One mantissa block: integer digit, seven fraction bytes, sign-info byte, exponent byte.
pub const SCALAR_BLOCK: usize = 10;

pub const TAG: usize = 3;
pub const VARIABLE_NAME: usize = 8;
pub const REALNESS_TAG: usize = 9;

pub const MIN_CHECKSUMMED: usize = REAL_VALUE;
pub const MAX_FRAME: usize = 50;
