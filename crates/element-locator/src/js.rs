//! Browser-side JS helper library, evaluated once per expression via
//! `Runtime.evaluate` (through `PageController::evaluate_in_frame`). Elements
//! are kept alive across calls in a page-global handle map rather than by
//! threading CDP `objectId`s through every crate, so later primitives only
//! ever need a short opaque string to refer back to the same node.

pub const HELPER_LIBRARY: &str = r#"
(function () {
  const store = (window.__cdpSkillHandles = window.__cdpSkillHandles || { map: new Map(), next: 1 });

  function register(el) {
    if (!el) return null;
    const id = 'h' + store.next++;
    store.map.set(id, el);
    return id;
  }

  function getHandle(id) {
    const el = store.map.get(id);
    if (el && document.contains(el)) return el;
    store.map.delete(id);
    return null;
  }

  function role(el) {
    const explicit = el.getAttribute && el.getAttribute('role');
    if (explicit) return explicit.split(' ')[0];
    const tag = el.tagName ? el.tagName.toLowerCase() : '';
    const type = (el.getAttribute && el.getAttribute('type') || '').toLowerCase();
    const implicit = {
      a: el.hasAttribute && el.hasAttribute('href') ? 'link' : 'generic',
      button: 'button',
      input: { text: 'textbox', search: 'searchbox', email: 'textbox', password: 'textbox',
                checkbox: 'checkbox', radio: 'radio', button: 'button', submit: 'button',
                range: 'slider' }[type] || 'textbox',
      select: 'combobox',
      textarea: 'textbox',
      img: 'img',
      h1: 'heading', h2: 'heading', h3: 'heading', h4: 'heading', h5: 'heading', h6: 'heading',
      ul: 'list', ol: 'list', li: 'listitem',
      nav: 'navigation', main: 'main', header: 'banner', footer: 'contentinfo',
      table: 'table', tr: 'row', td: 'cell', th: 'columnheader',
      option: 'option', form: 'form', dialog: 'dialog',
    }[tag];
    return implicit || 'generic';
  }

  function accessibleName(el) {
    const labelledby = el.getAttribute && el.getAttribute('aria-labelledby');
    if (labelledby) {
      const text = labelledby.split(/\s+/).map((id) => {
        const ref = document.getElementById(id);
        return ref ? ref.textContent.trim() : '';
      }).filter(Boolean).join(' ');
      if (text) return text;
    }
    const label = el.getAttribute && el.getAttribute('aria-label');
    if (label && label.trim()) return label.trim();
    if (el.tagName === 'INPUT' || el.tagName === 'TEXTAREA' || el.tagName === 'SELECT') {
      if (el.id) {
        const forLabel = document.querySelector('label[for="' + CSS.escape(el.id) + '"]');
        if (forLabel) return forLabel.textContent.trim();
      }
      const wrapping = el.closest('label');
      if (wrapping) return wrapping.textContent.trim();
      if (el.placeholder) return el.placeholder.trim();
    }
    if (el.tagName === 'IMG' && el.alt) return el.alt.trim();
    const title = el.getAttribute && el.getAttribute('title');
    if (title && title.trim()) return title.trim();
    return (el.textContent || '').trim().replace(/\s+/g, ' ');
  }

  function isVisible(el) {
    const style = window.getComputedStyle(el);
    if (style.visibility === 'hidden' || style.display === 'none' || style.opacity === '0') return false;
    const rect = el.getBoundingClientRect();
    return rect.width > 0 && rect.height > 0;
  }

  window.__cdpRegister = register;
  window.__cdpGetHandle = getHandle;
  window.__cdpRole = role;
  window.__cdpAccessibleName = accessibleName;
  window.__cdpIsVisible = isVisible;
})();
"#;

/// Wraps a one-liner in `HELPER_LIBRARY` + an IIFE that evaluates `body` and
/// returns its value; `body` may assume the `__cdp*` globals are present.
pub fn wrap(body: &str) -> String {
    format!("{HELPER_LIBRARY}\n(() => {{\n{body}\n}})()")
}
