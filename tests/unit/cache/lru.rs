use super::*;

fn keys(list: &LruList<&'static str>) -> Vec<&'static str> {
    list.iter().copied().collect()
}

#[test]
fn pop_front_returns_least_recent() {
    let mut l = LruList::new();
    l.push_back("a");
    l.push_back("b");
    l.push_back("c");
    assert_eq!(keys(&l), ["a", "b", "c"]);
    assert_eq!(l.pop_front(), Some("a"));
    assert_eq!(l.pop_front(), Some("b"));
    assert_eq!(l.len(), 1);
}

#[test]
fn remove_unlinks_from_the_middle() {
    let mut l = LruList::new();
    let _a = l.push_back("a");
    let b = l.push_back("b");
    let _c = l.push_back("c");
    assert_eq!(l.remove(b), Some("b"));
    assert_eq!(keys(&l), ["a", "c"]);
    assert_eq!(l.remove(b), None);
    assert_eq!(l.remove(HEAD), None);
    assert_eq!(l.remove(99), None);
    assert_eq!(l.len(), 2);
}

#[test]
fn freed_slots_are_reused() {
    let mut l = LruList::new();
    let a = l.push_back("a");
    l.push_back("b");
    l.remove(a);
    let d = l.push_back("d");
    assert_eq!(d, a);
    assert_eq!(keys(&l), ["b", "d"]);
}

#[test]
fn empty_list_pops_nothing() {
    let mut l: LruList<u32> = LruList::new();
    assert_eq!(l.pop_front(), None);
    assert_eq!(l.iter().count(), 0);
    l.push_back(7);
    assert_eq!(l.pop_front(), Some(7));
    assert_eq!(l.pop_front(), None);
}
