mod arith;
mod new;
mod others;
mod shape;
