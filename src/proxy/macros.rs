// src/proxy/macros.rs
//! Capability declaration macros
//!
//! [`capability!`](crate::capability) declares a typed trait together with
//! its dynamic dispatch table and a forwarding implementation for
//! [`Proxy`](crate::Proxy):
//!
//! ```ignore
//! interpose::capability! {
//!     pub trait Greeter as GreeterCapability = "app.Greeter" {
//!         fn name(&self) -> String;
//!         fn greet(&self, whom: String) -> String;
//!     }
//! }
//!
//! struct Person { name: String }
//!
//! impl Greeter for Person {
//!     fn name(&self) -> interpose::Result<String> { Ok(self.name.clone()) }
//!     fn greet(&self, whom: String) -> interpose::Result<String> {
//!         Ok(format!("Hello {}, I am {}", whom, self.name))
//!     }
//! }
//!
//! interpose::impl_target!(Person => GreeterCapability);
//! ```
//!
//! Every trait method returns `interpose::Result<R>`. Argument and return
//! types must implement [`IntoValue`](crate::IntoValue) and
//! [`FromValue`](crate::FromValue), so arguments are taken by value.

/// Declare a capability: typed trait, descriptor type and proxy forwarding
#[macro_export]
macro_rules! capability {
    (
        $(#[$meta:meta])*
        $vis:vis trait $trait_name:ident as $descriptor:ident = $qualified:literal {
            $(
                $(#[$method_meta:meta])*
                fn $method:ident(&self $(, $arg:ident : $arg_ty:ty)*) -> $ret:ty;
            )*
        }
    ) => {
        $(#[$meta])*
        $vis trait $trait_name: Send + Sync {
            $(
                $(#[$method_meta])*
                fn $method(&self $(, $arg: $arg_ty)*) -> $crate::Result<$ret>;
            )*
        }

        #[doc = concat!("Descriptor and dispatch table of `", $qualified, "`")]
        $vis struct $descriptor;

        impl $descriptor {
            pub const NAME: &'static str = $qualified;

            pub const METHODS: &'static [$crate::MethodSignature] = &[
                $(
                    $crate::MethodSignature::new(
                        stringify!($method),
                        &[$(stringify!($arg_ty)),*],
                    ),
                )*
            ];

            pub fn descriptor() -> $crate::Capability {
                $crate::Capability::new(Self::NAME, Self::METHODS)
            }

            /// Route a dynamic call to the typed implementation
            pub fn dispatch<T: $trait_name + ?Sized>(
                target: &T,
                method: &$crate::Method,
                args: &mut $crate::Arguments,
            ) -> $crate::Result<$crate::Value> {
                match method.name() {
                    $(
                        stringify!($method) => {
                            args.expect_len(method, <[&str]>::len(&[$(stringify!($arg)),*]))?;
                            #[allow(unused_mut, unused_variables)]
                            let mut _cursor = args.cursor();
                            let value = target.$method($(_cursor.take::<$arg_ty>()?),*)?;
                            Ok($crate::IntoValue::into_value(value))
                        }
                    )*
                    other => Err($crate::AopError::NoSuchMethod {
                        capability: Self::NAME.to_string(),
                        method: other.to_string(),
                    }),
                }
            }
        }

        impl $trait_name for $crate::Proxy {
            $(
                fn $method(&self $(, $arg: $arg_ty)*) -> $crate::Result<$ret> {
                    let method = $crate::Method::new(
                        $qualified,
                        stringify!($method),
                        &[$(stringify!($arg_ty)),*],
                    );
                    let args = $crate::Arguments::new(vec![$($crate::IntoValue::into_value($arg)),*]);
                    let value = self.invoke(&method, args)?;
                    <$ret as $crate::FromValue>::from_value(value)
                }
            )*
        }
    };
}

/// Implement [`Target`](crate::Target) from a list of capability descriptors
#[macro_export]
macro_rules! impl_target {
    ($ty:ty => $($descriptor:ident),+ $(,)?) => {
        impl $crate::Target for $ty {
            fn capabilities(&self) -> ::std::vec::Vec<$crate::Capability> {
                ::std::vec![$($descriptor::descriptor()),+]
            }

            fn invoke(
                &self,
                method: &$crate::Method,
                args: &mut $crate::Arguments,
            ) -> $crate::Result<$crate::Value> {
                $(
                    if method.capability() == $descriptor::NAME {
                        return $descriptor::dispatch(self, method, args);
                    }
                )+
                Err($crate::AopError::UnsupportedCapability(
                    method.capability().to_string(),
                ))
            }
        }
    };
}
