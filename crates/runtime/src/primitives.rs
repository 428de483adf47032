//! The minimum-viable primitive word catalog (spec §6), installed into
//! every fresh [`Runtime`] at construction time.

use gale_core::refcell::{Handle, PruneMode};
use gale_core::shape::PrimKind;
use gale_core::signature::WordSignature;

use crate::error::{Error, Result};
use crate::object::{Kind, Object};
use crate::runtime::Runtime;
use crate::word::{BoxedObject, ObjectHandle, SignatureSource, WordData, WordHandle, WordSignatureState};

fn catchall(id: u8) -> gale_core::shape::Shape {
    gale_core::shape::Shape::new(gale_core::shape::ShapeContents::CatchAll(id))
}

/// `@EQ ( @1 @1 -> Boolean )`: pops two objects, pushes `true` if they are
/// the same kind and equal, `false` otherwise; cross-kind is a
/// `TypeError`.
fn prim_eq(rt: &mut Runtime) -> Result<()> {
    let (a, b) = rt.stack.pop_pair()?;
    let result = a.eq_obj(&b);
    a.deinit();
    b.deinit();
    rt.stack.push(Object::Boolean(result?))?;
    Ok(())
}

/// `@DROP ( @1 -> )`: pop and deinit.
fn prim_drop(rt: &mut Runtime) -> Result<()> {
    let obj = rt.stack.pop()?;
    obj.deinit();
    Ok(())
}

/// `@DUP ( @1 -> @1 @1 )`.
fn prim_dup(rt: &mut Runtime) -> Result<()> {
    rt.stack.dup()?;
    Ok(())
}

/// `@2DUPSHUF ( @2 @1 -> @2 @1 @2 @1 )`.
fn prim_2dupshuf(rt: &mut Runtime) -> Result<()> {
    rt.stack.dup2_shuffle()?;
    Ok(())
}

/// `@SWAP ( @2 @1 -> @1 @2 )`.
fn prim_swap(rt: &mut Runtime) -> Result<()> {
    rt.stack.swap()?;
    Ok(())
}

/// `@LIT ( @1 -> Word )`: moves the top object to the heap and returns a
/// `HeapLit` word whose signature is the well-known `NullarySingle(kind)`
/// of the object lifted.
fn prim_lit(rt: &mut Runtime) -> Result<()> {
    let obj = rt.stack.pop()?;
    let kind = obj.kind();
    let object_handle: ObjectHandle = Handle::new_referenced(BoxedObject(obj));
    let signature = kind.prim_kind().map(|pk| WordSignatureState {
        source: SignatureSource::Inferred,
        handle: rt.well_known.nullary_single(pk),
    });
    let word = WordData::new_heaplit(object_handle, signature);
    let handle: WordHandle = Handle::new_referenced(word);
    rt.stack.push(Object::Word(handle))?;
    Ok(())
}

/// `@CONDJMP ( Word Boolean -> )`: consumes both; runs the word iff the
/// boolean is true.
fn prim_condjmp(rt: &mut Runtime) -> Result<()> {
    let (word_obj, bool_obj) = rt.stack.pop_pair()?;
    bool_obj.assert_is_kind(Kind::Boolean)?;
    word_obj.assert_is_kind(Kind::Word)?;
    let Object::Boolean(cond) = bool_obj else { unreachable!() };
    let Object::Word(handle) = word_obj else { unreachable!() };
    let result = if cond { crate::word::run_word(rt, handle) } else { Ok(()) };
    word_obj.deinit();
    bool_obj.deinit();
    result
}

/// `@CONDJMP2 ( Word Word Boolean -> )`: `near far cond` — runs `near` if
/// `cond`, else `far`; consumes all three.
fn prim_condjmp2(rt: &mut Runtime) -> Result<()> {
    let (near_obj, far_obj, bool_obj) = rt.stack.pop_trio()?;
    bool_obj.assert_is_kind(Kind::Boolean)?;
    near_obj.assert_is_kind(Kind::Word)?;
    far_obj.assert_is_kind(Kind::Word)?;
    let Object::Boolean(cond) = bool_obj else { unreachable!() };
    let Object::Word(near) = near_obj else { unreachable!() };
    let Object::Word(far) = far_obj else { unreachable!() };
    let result = if cond { crate::word::run_word(rt, near) } else { crate::word::run_word(rt, far) };
    near_obj.deinit();
    far_obj.deinit();
    bool_obj.deinit();
    result
}

/// Shared body for `@DEFINE-WORD-VAn`: pop the trailing `Symbol`, then pop
/// `n` `Word` objects (deepest-first = call order), and register the
/// resulting compound word.
fn define_word_van(rt: &mut Runtime, n: usize) -> Result<()> {
    let symbol_obj = rt.stack.pop()?;
    symbol_obj.assert_is_kind(Kind::Symbol)?;
    let Object::Symbol(symbol) = symbol_obj else { unreachable!() };

    let mut targets = Vec::with_capacity(n);
    for _ in 0..n {
        let obj = rt.stack.pop()?;
        if let Err(e) = obj.assert_is_kind(Kind::Word) {
            obj.deinit();
            symbol_obj.deinit();
            return Err(e);
        }
        let Object::Word(handle) = obj else { unreachable!() };
        targets.push(handle);
    }
    targets.reverse();

    let compound = WordData::new_compound(targets, None);
    let handle: WordHandle = Handle::new_referenced(compound);
    rt.dictionary.append(symbol, handle);
    // The dictionary now owns the symbol reference that was on the stack;
    // do not also deinit `symbol_obj` — ownership transferred, matching
    // spec §4.6's "interns/refs the symbol" (the ref taken when the
    // literal symbol was pushed onto the stack is the same ref the
    // dictionary now holds).
    Ok(())
}

macro_rules! define_word_van_primitive {
    ($name:ident, $n:expr) => {
        fn $name(rt: &mut Runtime) -> Result<()> {
            define_word_van(rt, $n)
        }
    };
}
define_word_van_primitive!(prim_define_word_va1, 1);
define_word_van_primitive!(prim_define_word_va2, 2);
define_word_van_primitive!(prim_define_word_va3, 3);
define_word_van_primitive!(prim_define_word_va4, 4);
define_word_van_primitive!(prim_define_word_va5, 5);

/// `@PRIV_SPACE_SET_BYTE ( UInt UInt -> )`: `value address` — write
/// `value` at `address`.
fn prim_priv_space_set_byte(rt: &mut Runtime) -> Result<()> {
    let (value_obj, addr_obj) = rt.stack.pop_pair()?;
    value_obj.assert_is_kind(Kind::UnsignedInt)?;
    addr_obj.assert_is_kind(Kind::UnsignedInt)?;
    let Object::UnsignedInt(value) = value_obj else { unreachable!() };
    let Object::UnsignedInt(addr) = addr_obj else { unreachable!() };
    if value > u8::MAX as u64 {
        return Err(Error::ValueError(format!("private-space byte value {value} does not fit in a byte")));
    }
    rt.private_space.set_byte(addr as usize, value as u8)
}

/// `@BEFORE_WORD ( Word -> )`: register a per-word pre-dispatch hook.
fn prim_before_word(rt: &mut Runtime) -> Result<()> {
    let obj = rt.stack.pop()?;
    obj.assert_is_kind(Kind::Word)?;
    let Object::Word(handle) = obj else { unreachable!() };
    rt.set_before_word_hook(handle);
    Ok(())
}

/// Install the entire catalog, each under its canonical `@NAME`.
pub fn install(rt: &mut Runtime) {
    let boolean = rt.well_known.shape(PrimKind::Boolean).clone();
    let word_shape = rt.well_known.shape(PrimKind::Word).clone();
    let uint_shape = rt.well_known.shape(PrimKind::UInt).clone();

    let eq_sig = rt.signatures.intern(WordSignature::PurelyAdditive {
        expects: vec![catchall(1), catchall(1)],
        gives: vec![boolean.clone()],
    });
    let drop_sig = rt.signatures.intern(WordSignature::PurelyConsuming(vec![catchall(1)]));
    let dup_sig = rt.signatures.intern(WordSignature::Mutative {
        before: vec![catchall(1)],
        after: vec![catchall(1), catchall(1)],
    });
    let shuf_sig = rt.signatures.intern(WordSignature::Mutative {
        before: vec![catchall(2), catchall(1)],
        after: vec![catchall(2), catchall(1), catchall(2), catchall(1)],
    });
    let swap_sig = rt.signatures.intern(WordSignature::Mutative {
        before: vec![catchall(2), catchall(1)],
        after: vec![catchall(1), catchall(2)],
    });
    let lit_sig = rt
        .signatures
        .intern(WordSignature::PurelyAdditive { expects: vec![catchall(1)], gives: vec![word_shape.clone()] });
    let condjmp_sig = rt.signatures.intern(WordSignature::PurelyConsuming(vec![word_shape.clone(), boolean.clone()]));
    let condjmp2_sig = rt.signatures.intern(WordSignature::PurelyConsuming(vec![
        word_shape.clone(),
        word_shape.clone(),
        boolean.clone(),
    ]));
    let priv_space_sig =
        rt.signatures.intern(WordSignature::PurelyConsuming(vec![uint_shape.clone(), uint_shape.clone()]));
    let before_word_sig = rt.signatures.intern(WordSignature::SideEffectary);

    let entries: [(&[u8], crate::word::PrimitiveFn, gale_core::signature::SignatureHandle); 13] = [
        (b"@EQ", prim_eq, eq_sig),
        (b"@DROP", prim_drop, drop_sig),
        (b"@DUP", prim_dup, dup_sig),
        (b"@2DUPSHUF", prim_2dupshuf, shuf_sig),
        (b"@SWAP", prim_swap, swap_sig),
        (b"@LIT", prim_lit, lit_sig),
        (b"@CONDJMP", prim_condjmp, condjmp_sig),
        (b"@CONDJMP2", prim_condjmp2, condjmp2_sig),
        (b"@DEFINE-WORD-VA1", prim_define_word_va1, before_word_sig),
        (b"@DEFINE-WORD-VA2", prim_define_word_va2, before_word_sig),
        (b"@DEFINE-WORD-VA3", prim_define_word_va3, before_word_sig),
        (b"@DEFINE-WORD-VA4", prim_define_word_va4, before_word_sig),
        (b"@DEFINE-WORD-VA5", prim_define_word_va5, before_word_sig),
    ];
    for (name, f, sig) in entries {
        install_one(rt, name, f, sig);
    }
    install_one(rt, b"@PRIV_SPACE_SET_BYTE", prim_priv_space_set_byte, priv_space_sig);
    install_one(rt, b"@BEFORE_WORD", prim_before_word, before_word_sig);
}

fn install_one(
    rt: &mut Runtime,
    name: &[u8],
    f: crate::word::PrimitiveFn,
    sig: gale_core::signature::SignatureHandle,
) {
    let state = WordSignatureState { source: SignatureSource::Declared, handle: sig };
    let word = WordData::new_primitive(f, Some(state));
    let handle: WordHandle = Handle::new_referenced(word);
    let (symbol, _) = rt.symbols.get_or_put(name);
    rt.dictionary.append(symbol, handle);
}
