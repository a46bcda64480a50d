use deferral_core::{
    LazyTensor, Operand, Result, Storage,
    backends::{
        Backend,
        broadcast::BroadcastFunc,
        map::MapFunc,
        matmul::MatmulFunc,
        ops::{
            Abs, Acos, Acosh, Add, Asin, Asinh, Atan, Atanh, Cos, Cosh, Divide, Exp, Exp2, Frac,
            Log, Log1p, Log2, Log10, Matmul, Maximum, Minimum, Multiply, Neg, Pow, Relu, Remainder,
            Sin, Sinh, Subtract, Sum, Tan, Tanh, TruncDivide,
        },
        reduce::ReduceFunc,
    },
};

use crate::functions::{
    broadcast_fn, clamp_bounds, clamp_fn, floor_div_fn, map_fn, matmul_fn, positive_fn,
    reduce_fn, reshape_fn,
};

macro_rules! lazy_ops {
    (
        unary: [$($u:ident => $uop:ident),* $(,)?],
        binary: [$($b:ident => $bop:ident),* $(,)?] $(,)?
    ) => {
        /// Method-call form of the operator library.
        ///
        /// Every method binds the receiver as the first operand of the same
        /// adapter the free function in [`crate::functions`] uses, so
        /// `x.add::<B>(y)` and `add::<B, _>(&x, y)` build equivalent nodes.
        pub trait LazyOps<S: Storage> {
            $(
                fn $u<B>(&self) -> Result<LazyTensor<S>>
                where
                    B: Backend + $uop,
                    <B as $uop>::$uop: MapFunc<S> + 'static;
            )*

            $(
                fn $b<B>(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>>
                where
                    B: Backend + $bop,
                    <B as $bop>::$bop: BroadcastFunc<S> + 'static;
            )*

            fn positive(&self) -> Result<LazyTensor<S>>;

            fn reshape(&self, shape: impl Into<Vec<usize>>) -> Result<LazyTensor<S>>;

            /// Always fails with an unsupported-operation error.
            fn floor_div(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>>;

            fn sum<B>(&self, dim: i32, keepdim: bool) -> Result<LazyTensor<S>>
            where
                B: Backend + Sum,
                <B as Sum>::Sum: ReduceFunc<S> + 'static;

            fn matmul<B>(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>>
            where
                B: Backend + Matmul,
                <B as Matmul>::Matmul: MatmulFunc<S> + 'static;

            fn clamp<B>(
                &self,
                min: Option<Operand<S>>,
                max: Option<Operand<S>>,
            ) -> Result<LazyTensor<S>>
            where
                B: Backend + Maximum + Minimum,
                <B as Maximum>::Maximum: BroadcastFunc<S> + 'static,
                <B as Minimum>::Minimum: BroadcastFunc<S> + 'static;
        }

        impl<S: Storage> LazyOps<S> for LazyTensor<S> {
            $(
                fn $u<B>(&self) -> Result<LazyTensor<S>>
                where
                    B: Backend + $uop,
                    <B as $uop>::$uop: MapFunc<S> + 'static,
                {
                    map_fn(<B as $uop>::as_arc()).bind(self).call([])
                }
            )*

            $(
                fn $b<B>(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>>
                where
                    B: Backend + $bop,
                    <B as $bop>::$bop: BroadcastFunc<S> + 'static,
                {
                    broadcast_fn(<B as $bop>::as_arc()).bind(self).call([other.into()])
                }
            )*

            fn positive(&self) -> Result<LazyTensor<S>> {
                positive_fn().bind(self).call([])
            }

            fn reshape(&self, shape: impl Into<Vec<usize>>) -> Result<LazyTensor<S>> {
                reshape_fn(shape.into()).bind(self).call([])
            }

            fn floor_div(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>> {
                floor_div_fn().bind(self).call([other.into()])
            }

            fn sum<B>(&self, dim: i32, keepdim: bool) -> Result<LazyTensor<S>>
            where
                B: Backend + Sum,
                <B as Sum>::Sum: ReduceFunc<S> + 'static,
            {
                reduce_fn(<B as Sum>::as_arc(), dim, keepdim).bind(self).call([])
            }

            fn matmul<B>(&self, other: impl Into<Operand<S>>) -> Result<LazyTensor<S>>
            where
                B: Backend + Matmul,
                <B as Matmul>::Matmul: MatmulFunc<S> + 'static,
            {
                matmul_fn(<B as Matmul>::as_arc()).bind(self).call([other.into()])
            }

            fn clamp<B>(
                &self,
                min: Option<Operand<S>>,
                max: Option<Operand<S>>,
            ) -> Result<LazyTensor<S>>
            where
                B: Backend + Maximum + Minimum,
                <B as Maximum>::Maximum: BroadcastFunc<S> + 'static,
                <B as Minimum>::Minimum: BroadcastFunc<S> + 'static,
            {
                clamp_fn(<B as Maximum>::as_arc(), <B as Minimum>::as_arc())
                    .bind(self)
                    .invoke(Vec::new(), clamp_bounds(min, max))
            }
        }
    };
}

lazy_ops! {
    unary: [
        neg => Neg,
        abs => Abs,
        exp => Exp,
        log => Log,
        sin => Sin,
        cos => Cos,
        tanh => Tanh,
        relu => Relu,
        frac => Frac,
        exp2 => Exp2,
        log2 => Log2,
        log10 => Log10,
        log1p => Log1p,
        tan => Tan,
        asin => Asin,
        acos => Acos,
        atan => Atan,
        sinh => Sinh,
        cosh => Cosh,
        asinh => Asinh,
        acosh => Acosh,
        atanh => Atanh,
    ],
    binary: [
        add => Add,
        sub => Subtract,
        mul => Multiply,
        div => Divide,
        div_trunc => TruncDivide,
        remainder => Remainder,
        pow => Pow,
        maximum => Maximum,
        minimum => Minimum,
    ],
}
