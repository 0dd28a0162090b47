//! crate-internal macros

/// Generate a consuming `with_*` and a borrowing `set_*` builder method
/// from a single body.
///
/// Fallible bodies (returning `Result<Self, E>`) generate
/// `try_with_*` and `try_set_*` instead.
macro_rules! generate_set_and_with {
    (
        $(#[$outer_doc:meta])*
        $vis:vis fn $fn_name:ident(mut $self_token:ident $(, $param_name:ident: $param_ty:ty)* $(,)?) -> Self {
            $($body:tt)*
        }
    ) => {
        ::paste::paste! {
            $(#[$outer_doc])*
            #[must_use]
            $vis fn [<with_ $fn_name>](mut $self_token $(, $param_name: $param_ty)*) -> Self {
                $($body)*
            }

            $(#[$outer_doc])*
            $vis fn [<set_ $fn_name>](&mut $self_token $(, $param_name: $param_ty)*) -> &mut Self {
                $($body)*
            }
        }
    };
    (
        $(#[$outer_doc:meta])*
        $vis:vis fn $fn_name:ident(mut $self_token:ident $(, $param_name:ident: $param_ty:ty)* $(,)?) -> Result<Self, $err:ty> {
            $($body:tt)*
        }
    ) => {
        ::paste::paste! {
            $(#[$outer_doc])*
            $vis fn [<try_with_ $fn_name>](mut $self_token $(, $param_name: $param_ty)*) -> Result<Self, $err> {
                $($body)*
            }

            $(#[$outer_doc])*
            $vis fn [<try_set_ $fn_name>](&mut $self_token $(, $param_name: $param_ty)*) -> Result<&mut Self, $err> {
                $($body)*
            }
        }
    };
}
pub(crate) use generate_set_and_with;

/// Define a closed enumeration of protocol string values.
///
/// Parsing is ASCII case-insensitive and fails with an
/// invalid-enumeration [`SseError`](crate::SseError) for anything
/// that is not one of the listed values.
macro_rules! enum_builder {
    (
        $(#[$m:meta])*
        $enum_vis:vis enum $enum_name:ident {
            $( $(#[$enum_meta:meta])* $enum_var:ident => $enum_val:literal ),+ $(,)?
        }
    ) => {
        $(#[$m])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $enum_vis enum $enum_name {
            $(
                $(#[$enum_meta])*
                $enum_var
            ),+
        }

        impl $enum_name {
            /// Return the protocol value of this variant.
            #[must_use]
            $enum_vis const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$enum_var => $enum_val ),+
                }
            }

            /// Return the protocol value of this variant as a [`SmolStr`](::smol_str::SmolStr).
            #[must_use]
            $enum_vis const fn as_smol_str(self) -> ::smol_str::SmolStr {
                ::smol_str::SmolStr::new_static(self.as_str())
            }
        }

        impl ::std::str::FromStr for $enum_name {
            type Err = $crate::SseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let value = s.trim();
                $(
                    if value.eq_ignore_ascii_case($enum_val) {
                        return Ok(Self::$enum_var);
                    }
                )+
                Err($crate::SseError::invalid_enum_value(stringify!($enum_name), s))
            }
        }

        impl TryFrom<&str> for $enum_name {
            type Error = $crate::SseError;

            #[inline]
            fn try_from(s: &str) -> Result<Self, Self::Error> {
                s.parse()
            }
        }

        impl ::std::fmt::Display for $enum_name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::serde::Serialize for $enum_name {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: ::serde::Serializer,
            {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $enum_name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: ::serde::Deserializer<'de>,
            {
                let s = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                s.parse().map_err(::serde::de::Error::custom)
            }
        }
    };
}
pub(crate) use enum_builder;
