/// Compile-time assertion. The condition is evaluated in a `const` context,
/// so a violation fails the build rather than the test suite.
///
/// ```
/// rfse_foundation::const_assert!(u16::MAX as u32 == 65535);
/// ```
#[macro_export]
macro_rules! const_assert {
    ($cond:expr $(,)?) => {
        const _: () = assert!($cond);
    };
}
