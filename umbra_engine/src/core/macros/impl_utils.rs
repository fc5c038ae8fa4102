/// Helper macro to provide implementations of operator traits
///
/// Expands to the four owned/borrowed combinations of `lhs` and `rhs`.
/// The body sees owned copies of both operands.
#[macro_export]
macro_rules! impl_op {
    (impl $({$($bounds:tt)*})? $($operator:ident)::+ : fn $fn_name:ident ($a:ident : $a_ty:ty, $b:ident : $b_ty:ty) -> $ret_ty:ty $body:block) => {
        $crate::impl_op!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a:  $a_ty, $b:  $b_ty) -> $ret_ty $body);
        $crate::impl_op!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a:  $a_ty, $b: &$b_ty) -> $ret_ty $body);
        $crate::impl_op!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a: &$a_ty, $b:  $b_ty) -> $ret_ty $body);
        $crate::impl_op!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a: &$a_ty, $b: &$b_ty) -> $ret_ty $body);
    };

    (@inner impl $({ $($bounds:tt)* })? $($operator:ident)::+ : fn $fn_name:ident ($a:ident: $a_ty:ty, $b:ident : $b_ty:ty) -> $ret_ty:ty $body:block) => {
        impl $(< $($bounds)* >)?  $($operator)::+<$b_ty> for $a_ty {
            type Output = $ret_ty;

            fn $fn_name(self, rhs: $b_ty) -> Self::Output {
                #[allow(unused_mut, clippy::clone_on_copy)]
                let (mut $a, $b) = (self.clone(), rhs.clone());
                $body
            }
        }
    };
}

/// See [impl_op]
#[macro_export]
macro_rules! impl_op_assign {
    (impl $({$($bounds:tt)*})? $($operator:ident)::+ : fn $fn_name:ident ($a:ident : $a_ty:ty, $b:ident : $b_ty:ty) $body:block) => {
        $crate::impl_op_assign!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a: $a_ty, $b:  $b_ty) $body);
        $crate::impl_op_assign!(@inner impl $({$($bounds)*})? $($operator)::+ : fn $fn_name ($a: $a_ty, $b: &$b_ty) $body);
    };

    (@inner impl $({$($bounds:tt)*})? $($operator:ident)::+ : fn $fn_name:ident ($a:ident: $lhs:ty, $b:ident : $rhs:ty) $body:block) => {
        impl $(< $($bounds)* >)? $($operator)::+<$rhs> for $lhs {
            fn $fn_name(&mut self, rhs: $rhs) {
                #[allow(unused_mut, clippy::clone_on_copy)]
                let (mut $a, $b) = (self.clone(), rhs.clone());
                $body;
                *self = $a;
            }
        }
    };
}
