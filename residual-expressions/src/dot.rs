use crate::{Expression, Kind};
use std::collections::HashSet;
use std::io;
use std::io::Write;

impl<T> Expression<T> {
    /// Writes this expression as a graphviz digraph. Physically shared nodes are
    /// drawn once, so interned expressions show their sharing.
    pub fn output_dot(&self, w: &mut impl Write) -> io::Result<()> {
        writeln!(w, "digraph {{")?;

        let mut visited = HashSet::new();
        let mut work_list = vec![self];
        while let Some(node) = work_list.pop() {
            let src = node.address();
            if !visited.insert(src) {
                continue;
            }

            let attrs = if node.is_nullable() {
                ", shape=doublecircle"
            } else {
                ""
            };
            writeln!(w, "node[label=\"{}\"{attrs}] id{src}", label(node))?;

            for (i, child) in node.children().enumerate() {
                writeln!(w, "id{src} -> id{} [label=\"{i}\"]", child.address())?;
                work_list.push(child);
            }
        }

        writeln!(w, "}}")?;

        Ok(())
    }
}

fn label<T>(node: &Expression<T>) -> String {
    match node.kind() {
        Kind::Fail => "0".to_string(),
        Kind::Accept => "e".to_string(),
        Kind::Any => "_".to_string(),
        Kind::Literal(p) => p.to_string().replace('\\', "\\\\").replace('"', "\\\""),
        Kind::Concat(..) => "·".to_string(),
        Kind::Alternate(..) => "|".to_string(),
        Kind::Star(_) => "*".to_string(),
        Kind::Intersect(..) => "&".to_string(),
        Kind::Difference(..) => "-".to_string(),
        Kind::Complement(_) => "~".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use crate::{Expression, MemoCache, Predicate};

    #[test]
    fn shared_nodes_drawn_once() {
        let a = Expression::literal(Predicate::equal_to("a"));
        let cache = MemoCache::new();
        let expr = cache.intern(&a.clone().concat(a.clone()).alternate(a.star()));

        let mut out = Vec::new();
        expr.output_dot(&mut out).unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.starts_with("digraph {"));
        assert_eq!(out.matches("label=\"\\\"a\\\"\"").count(), 1);
        assert_eq!(out.matches("doublecircle").count(), 2);
    }
}
