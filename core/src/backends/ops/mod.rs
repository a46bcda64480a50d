//! One trait per operation. A backend provides an operation by naming the
//! kernel type that implements it.

macro_rules! backend_op {
    ($($op:ident),* $(,)?) => {
        $(
            pub trait $op {
                type $op: Default;

                fn as_arc() -> std::sync::Arc<Self::$op> {
                    std::sync::Arc::new(Self::$op::default())
                }
            }
        )*
    };
}

backend_op!(Neg, Abs, Exp, Log, Sin, Cos, Tanh, Relu);

backend_op!(
    Frac,
    Exp2,
    Log2,
    Log10,
    Log1p,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Asinh,
    Acosh,
    Atanh,
);

backend_op!(
    Add,
    Subtract,
    Multiply,
    Divide,
    TruncDivide,
    Remainder,
    Pow,
    Maximum,
    Minimum,
);

backend_op!(Sum, Matmul);
