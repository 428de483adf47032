//! End-to-end scenario tests mirroring the E1-E6 walkthroughs, driven
//! entirely through the public `gale_runtime::Runtime` surface (no
//! `crate::` internals), the way the teacher's `tests/test_closures.rs`
//! exercises its FFI boundary from outside the crate.

use gale_core::refcell::Handle;
use gale_core::shape::PrimKind;
use gale_runtime::{Object, Result, Runtime, SignatureSource, WordData, WordHandle, WordSignatureState};

/// E1: a mixed literal stream leaves the stack in the documented
/// top-down order.
#[test]
fn e1_mixed_literal_stream() {
    let mut rt = Runtime::new();
    rt.eval("1 2/i 3.14 4 :something \"foo and a bit of bar\" 5/u 6/i 7.5").unwrap();

    assert_eq!(rt.stack.len(), 9);
    assert!(matches!(rt.stack.pop().unwrap(), Object::Float(f) if f == 7.5));
    assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(6)));
    assert!(matches!(rt.stack.pop().unwrap(), Object::UnsignedInt(5)));
    match rt.stack.pop().unwrap() {
        Object::String(h) => assert_eq!(&*h.get().0, b"foo and a bit of bar"),
        other => panic!("expected String, got {other:?}"),
    }
    match rt.stack.pop().unwrap() {
        Object::Symbol(h) => assert_eq!(&*h.get().0, b"something"),
        other => panic!("expected Symbol, got {other:?}"),
    }
    assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(4)));
    assert!(matches!(rt.stack.pop().unwrap(), Object::Float(f) if f == 3.14));
    assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(2)));
    assert!(matches!(rt.stack.pop().unwrap(), Object::SignedInt(1)));
}

/// E2: `@EQ` on matching kinds pushes `true`; on mismatched kinds it is a
/// `TypeError` and the stack is left with nothing popped beyond the two
/// operands `@EQ` itself consumed.
#[test]
fn e2_eq_same_kind_and_cross_kind_type_error() {
    let mut rt = Runtime::new();
    rt.eval("1 1 @EQ").unwrap();
    assert_eq!(rt.stack.len(), 1);
    match rt.stack.pop().unwrap() {
        Object::Boolean(b) => assert!(b),
        other => panic!("expected Boolean(true), got {other:?}"),
    }

    rt.stack.push(Object::Boolean(true)).unwrap();
    rt.stack.push(Object::UnsignedInt(1)).unwrap();
    let err = rt.eval("@EQ").unwrap_err();
    assert!(matches!(err, gale_runtime::Error::TypeError { .. }));
}

/// E3: pushing a primitive word by reference, duplicating it, and
/// conditionally jumping to it twice (once true, once false) leaves
/// exactly one `UnsignedInt(1)` and leaks nothing.
#[test]
fn e3_ref_dup_and_condjmp_twice() {
    let mut rt = Runtime::new();
    install_push_one(&mut rt, b"push-one");

    rt.eval("&push-one @DUP").unwrap();
    rt.stack.push(Object::Boolean(true)).unwrap();
    rt.eval("@CONDJMP").unwrap();
    rt.stack.push(Object::Boolean(false)).unwrap();
    rt.eval("@CONDJMP").unwrap();

    assert_eq!(rt.stack.len(), 1);
    match rt.stack.pop().unwrap() {
        Object::UnsignedInt(1) => {}
        other => panic!("expected UnsignedInt(1), got {other:?}"),
    }
}

/// E4: defining a word via `@DEFINE-WORD-VA1` and then invoking it
/// through ordinary dictionary lookup runs the same body that `&ref`
/// would have pushed directly.
#[test]
fn e4_define_word_va1_then_dictionary_dispatch() {
    let mut rt = Runtime::new();
    install_push_one(&mut rt, b"push-one-raw");

    rt.eval("&push-one-raw :push-one @DEFINE-WORD-VA1").unwrap();
    rt.eval("push-one").unwrap();

    assert_eq!(rt.stack.len(), 1);
    match rt.stack.pop().unwrap() {
        Object::UnsignedInt(1) => {}
        other => panic!("expected UnsignedInt(1), got {other:?}"),
    }
}

/// E5: two signatures built from the same well-known shape pointer
/// compare compatible; a `( -> Boolean Boolean )` signature does not
/// satisfy a `( -> Boolean )` expectation.
#[test]
fn e5_signature_shape_count_mismatch() {
    let mut rt = Runtime::new();
    let boolean = rt.well_known.shape(PrimKind::Boolean).clone();

    let single =
        rt.signatures.intern(gale_core::signature::WordSignature::Nullary(vec![boolean.clone()]));
    let single_again =
        rt.signatures.intern(gale_core::signature::WordSignature::Nullary(vec![boolean.clone()]));
    assert_eq!(single.addr(), single_again.addr());
    assert_eq!(single.get().compatible_with(single_again.get()), Ok(gale_core::SignatureCompat::Compatible));

    let pair = rt.signatures.intern(gale_core::signature::WordSignature::Nullary(vec![
        boolean.clone(),
        boolean.clone(),
    ]));
    let err = single.get().compatible_with(pair.get()).unwrap_err();
    match err {
        gale_core::SignatureIncompatReason::DisparateShapeCount { left: None, right: Some(mismatch) } => {
            assert_eq!(mismatch.expected, 1);
            assert_eq!(mismatch.found, 2);
        }
        other => panic!("expected DisparateShapeCount{{right}}, got {other:?}"),
    }
}

/// Spec Testable Property 4: a concrete `( Boolean -> )` expectation
/// rejects a `( @1 -> )` provider; the reverse direction is compatible.
#[test]
fn property_4_catchall_provider_rejected_by_concrete_expectation() {
    let mut rt = Runtime::new();
    let boolean = rt.well_known.shape(PrimKind::Boolean).clone();

    let boolean_expected = rt
        .signatures
        .intern(gale_core::signature::WordSignature::PurelyConsuming(vec![boolean]));
    let catchall_provided = rt.signatures.intern(gale_core::signature::WordSignature::PurelyConsuming(vec![
        gale_core::shape::Shape::new(gale_core::shape::ShapeContents::CatchAll(1)),
    ]));

    assert!(boolean_expected.get().compatible_with(catchall_provided.get()).is_err());
    assert_eq!(
        catchall_provided.get().compatible_with(boolean_expected.get()),
        Ok(gale_core::SignatureCompat::Compatible)
    );
}

/// E6: evolving a shape twice yields distinct ids sharing one parent;
/// the two evolutions are themselves disparate.
#[test]
fn e6_double_evolution_is_disparate() {
    let mut rt = Runtime::new();
    let base = rt.well_known.shape(PrimKind::UInt).clone();
    let e0 = base.evolve();
    let e1 = base.evolve();

    assert_eq!(e0.evolution_id(), 0);
    assert_eq!(e1.evolution_id(), 1);
    assert_eq!(
        e0.compatible_with(&e1),
        Err(gale_core::ShapeReason::DisparateEvolutions)
    );
}

/// Spec §8 testable property 8: writing the interpreter-mode byte
/// redirects the *next* identifier to a symbol push even though a word
/// of that name is defined.
#[test]
fn interpreter_mode_toggle_shadows_a_defined_word() {
    let mut rt = Runtime::new();
    rt.eval("1/u 0/u @PRIV_SPACE_SET_BYTE").unwrap();
    rt.eval("@EQ").unwrap();

    assert_eq!(rt.stack.len(), 1);
    match rt.stack.pop().unwrap() {
        Object::Symbol(h) => assert_eq!(&*h.get().0, b"@EQ"),
        other => panic!("expected Symbol(@EQ), got {other:?}"),
    }
}

fn install_push_one(rt: &mut Runtime, name: &[u8]) {
    fn push_one(rt: &mut Runtime) -> Result<()> {
        rt.stack.push(Object::UnsignedInt(1))?;
        Ok(())
    }
    let sig = rt.well_known.nullary_single(PrimKind::UInt);
    let word = WordData::new_primitive(
        push_one,
        Some(WordSignatureState { source: SignatureSource::Declared, handle: sig }),
    );
    let handle: WordHandle = Handle::new_referenced(word);
    let (symbol, _) = rt.symbols.get_or_put(name);
    rt.dictionary.append(symbol, handle);
}
