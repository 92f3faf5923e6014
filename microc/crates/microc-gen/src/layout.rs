//! Struct/union field layout and type sizing.
//!
//! Grounded in the reference emitter's `emitterStruct`/`emitterUnion`: a
//! struct's fields get sequential, word-rounded offsets and the struct's own
//! size is their sum; a union's fields all start at offset 0 and the
//! union's size is the widest field. Generalized from that C code's
//! sibling-linked-list walk (`sym->firstChild`/`nextSibling`) to a plain
//! `Vec<SymbolId>` walk over `SymbolTable::children`.

use microc_types::{SymbolClass, SymbolId, SymbolTable, Type};

/// Every value on this target occupies whole 8-byte words; no sub-word
/// packing, matching the original's alignment loop (`wordsize` rounding).
pub const WORD_SIZE: usize = 8;

/// The size in bytes of `ty`, rounding record sizes up to a whole number of
/// words at the point they were laid out by [`layout_record`].
pub fn size_of(ty: &Type, table: &SymbolTable) -> usize {
    match ty {
        Type::Invalid | Type::Void => 0,
        Type::Basic(sym) => {
            let s = table.get(*sym);
            match s.class {
                SymbolClass::Struct | SymbolClass::Union => s.layout.size.unwrap_or(0),
                // int/char/bool/enum and any other scalar `Type` symbol:
                // one word, no sub-word packing on this target.
                _ => WORD_SIZE,
            }
        }
        Type::Pointer(_) | Type::Function(_, _) => WORD_SIZE,
        Type::Array(elem, len) => size_of(elem, table) * len,
    }
}

fn words(size: usize) -> usize {
    ((size.max(1)) + WORD_SIZE - 1) / WORD_SIZE
}

/// Assigns every field of `record` (a struct or union symbol) a byte offset
/// and sets `record`'s own `layout.size` to the total. A no-op for any other
/// symbol class.
pub fn layout_record(record: SymbolId, table: &mut SymbolTable) {
    let class = table.get(record).class;
    let children = table.get(record).children().to_vec();

    match class {
        SymbolClass::Struct => {
            let mut size = 0usize;
            for field in children {
                table.get_mut(field).layout.offset = Some(size as i64);
                let field_ty = table.get(field).ty.clone();
                size += words(size_of(&field_ty, table)) * WORD_SIZE;
            }
            table.get_mut(record).layout.size = Some(size);
        }
        SymbolClass::Union => {
            let mut size = 0usize;
            for field in children {
                table.get_mut(field).layout.offset = Some(0);
                let field_ty = table.get(field).ty.clone();
                size = size.max(size_of(&field_ty, table));
            }
            table.get_mut(record).layout.size = Some(size);
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use microc_types::{SymbolClass as SC, SymbolTable};

    #[test]
    fn struct_fields_get_sequential_word_offsets() {
        let (mut table, builtins) = SymbolTable::with_builtins();
        let root = table.root();
        let point = table.create(SC::Struct, root, microc_util::Symbol::intern("Point"), Type::Void);
        let x = table.create(SC::Variable, root, microc_util::Symbol::intern("x"), Type::Basic(builtins.int));
        let y = table.create(SC::Variable, root, microc_util::Symbol::intern("y"), Type::Basic(builtins.int));
        table.add_child(point, x);
        table.add_child(point, y);

        layout_record(point, &mut table);

        assert_eq!(table.get(x).layout.offset, Some(0));
        assert_eq!(table.get(y).layout.offset, Some(8));
        assert_eq!(table.get(point).layout.size, Some(16));
    }

    #[test]
    fn union_fields_share_offset_zero() {
        let (mut table, builtins) = SymbolTable::with_builtins();
        let root = table.root();
        let u = table.create(SC::Union, root, microc_util::Symbol::intern("U"), Type::Void);
        let a = table.create(SC::Variable, root, microc_util::Symbol::intern("a"), Type::Basic(builtins.int));
        let b = table.create(SC::Variable, root, microc_util::Symbol::intern("b"), Type::Basic(builtins.char));
        table.add_child(u, a);
        table.add_child(u, b);

        layout_record(u, &mut table);

        assert_eq!(table.get(a).layout.offset, Some(0));
        assert_eq!(table.get(b).layout.offset, Some(0));
        assert_eq!(table.get(u).layout.size, Some(WORD_SIZE));
    }
}
