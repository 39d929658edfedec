/// Implements the [PacketOps](crate::PacketOps) trait for a named type.
#[macro_export]
macro_rules! impl_packet_ops {
    ($name:ident) => {
        impl $crate::PacketOps for $name {
            fn buf(&self) -> &[u8] {
                self.buf.as_ref()
            }

            fn buf_mut(&mut self) -> &mut [u8] {
                self.buf.as_mut()
            }
        }
    };
}

/// Implements the defaults for the [ValueOps](crate::ValueOps) trait for a
/// named type carrying one cell of a value stream.
#[macro_export]
macro_rules! impl_value_ops {
    ($name:ident) => {
        impl $crate::ValueOps for $name {}
    };
}

/// Implements the Default trait for a named type with a `Self::new()` function.
#[macro_export]
macro_rules! impl_default {
    ($name:ident) => {
        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// Provides convenience functions to deconstruct an enum with new-type variants.
#[macro_export]
macro_rules! inner_enum {
    // macro variant for when the enum variant and its type are the same ident
    ($ty:ident, $var:ident) => {
        inner_enum!($ty, $var, $var);
    };

    // macro variant for when the enum variant and its type are potentially different
    ($ty:ident, $var:ident, $var_ty:ident) => {
        impl $ty {
            ::paste::paste! {
                #[doc = "Gets whether `" $ty "` is the variant `" $var "`."]
                pub fn [<is_ $var:snake>](&self) -> bool {
                    matches!(self, $ty::$var(_))
                }

                #[doc = "Gets a reference to `" $ty "` as the variant `" $var "`'s inner type `" $var_ty "`."]
                pub fn [<as_ $var:snake>](&self) -> $crate::Result<&$var_ty> {
                    use $crate::Error;

                    match self {
                        $ty::$var(ty) => Ok(ty),
                        _ => Err(Error::failure(format!("have variant: {self}, expected: {}", $crate::std::any::type_name::<$var_ty>()))),
                    }
                }

                #[doc = "Converts `" $ty "` into the variant `" $var "`'s inner type `" $var_ty "`."]
                pub fn [<into_ $var:snake>](self) -> $crate::Result<$var_ty> {
                    use $crate::Error;

                    match self {
                        $ty::$var(ty) => Ok(ty),
                        _ => Err(Error::failure(format!("have variant: {self}, expected: {}", $crate::std::any::type_name::<$var_ty>()))),
                    }
                }
            }
        }
    };
}
