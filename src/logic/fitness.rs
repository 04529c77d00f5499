use crate::model::{Connection, Fiber, Link};

/// Whether `fiber` may ever serve `link`.
///
/// A fiber is ruled out only when it falls short of the link in both core count and
/// length. A short fiber with enough cores stays admissible because chained fibers
/// are checked against the link length as a sum.
pub fn is_admissible(fiber: &Fiber, link: &Link) -> bool {
    !(fiber.cores() < link.cores() && fiber.length() < link.length())
}
