// Topic descriptions — ranked keyword tables, labels, and id resolution.

pub mod resolver;
pub mod table;
