//! Typed views over a [`RemoteObject`](crate::proxy::RemoteObject).

/// Declares a typed stand-in with one accessor per snapshot key.
///
/// Values become synchronous getters returning `Option<T>` (absent or
/// ill-shaped values read as `None`). Methods become async functions that
/// serialize their arguments, call through the transport, and deserialize
/// the result.
///
/// ```ignore
/// remote_interface! {
///     pub struct Greeter {
///         values { name: String, visits: u64 }
///         methods {
///             greet(who: String) -> String;
///             reset() -> ();
///         }
///     }
/// }
///
/// let greeter = Greeter::new(remote_object);
/// assert_eq!(greeter.name().as_deref(), Some("host"));
/// let line = greeter.greet("you".into()).await?;
/// ```
#[macro_export]
macro_rules! remote_interface {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            values { $($value:ident : $value_ty:ty),* $(,)? }
            methods { $($method:ident ( $($arg:ident : $arg_ty:ty),* $(,)? ) -> $ret:ty;)* }
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            inner: $crate::proxy::RemoteObject,
        }

        impl $name {
            pub fn new(inner: $crate::proxy::RemoteObject) -> Self {
                Self { inner }
            }

            /// The untyped stand-in underneath.
            pub fn inner(&self) -> &$crate::proxy::RemoteObject {
                &self.inner
            }

            $(
                pub fn $value(&self) -> ::std::option::Option<$value_ty> {
                    self.inner.value_as(stringify!($value))
                }
            )*

            $(
                pub async fn $method(&self, $($arg: $arg_ty),*) -> $crate::proxy::Result<$ret> {
                    let args = ::std::vec![$($crate::proxy::encode_arg(&$arg)?),*];
                    let value = self.inner.call(stringify!($method), args).await?;
                    $crate::proxy::decode_return(value)
                }
            )*
        }
    };
}
