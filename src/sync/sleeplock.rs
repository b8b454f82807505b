//! Sleeplock - lock exclusivo que pode ser mantido durante I/O

use core::cell::UnsafeCell;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use core::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use spin::relax::{RelaxStrategy, Spin};

/// Lock exclusivo de longa duração.
///
/// # Diferença do spin::Mutex
///
/// - Pode ser mantido durante uma transferência de disco
/// - Nunca é tomado com um spinlock de bucket na mão
/// - Cada aquisição recebe um ticket; o guard sabe provar que é o dono
///
/// A espera usa a `RelaxStrategy` `R`: `Spin` em bare metal,
/// `spin::relax::Yield` quando há um escalonador por baixo (testes).
pub struct SleepLock<T: ?Sized, R = Spin> {
    /// Estado do lock
    locked: AtomicBool,
    /// Ticket do dono atual (0 = nenhum)
    holder: AtomicU32,
    /// Próximo ticket a entregar
    next_ticket: AtomicU32,
    relax: PhantomData<fn() -> R>,
    /// Dados protegidos
    data: UnsafeCell<T>,
}

// SAFETY: acesso aos dados só através do guard, que exige o lock
unsafe impl<T: ?Sized + Send, R> Send for SleepLock<T, R> {}
unsafe impl<T: ?Sized + Send, R> Sync for SleepLock<T, R> {}

impl<T, R> SleepLock<T, R> {
    pub const fn new(data: T) -> Self {
        Self {
            locked: AtomicBool::new(false),
            holder: AtomicU32::new(0),
            next_ticket: AtomicU32::new(1),
            relax: PhantomData,
            data: UnsafeCell::new(data),
        }
    }
}

impl<T: ?Sized, R: RelaxStrategy> SleepLock<T, R> {
    /// Adquire o lock, esperando o dono atual soltar.
    pub fn lock(&self) -> SleepLockGuard<'_, T, R> {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            // Espera ler o estado antes de tentar o CAS de novo
            while self.locked.load(Ordering::Relaxed) {
                R::relax();
            }
        }
        self.grant()
    }

    /// Tenta adquirir sem esperar
    pub fn try_lock(&self) -> Option<SleepLockGuard<'_, T, R>> {
        if self
            .locked
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
        {
            Some(self.grant())
        } else {
            None
        }
    }
}

impl<T: ?Sized, R> SleepLock<T, R> {
    fn grant(&self) -> SleepLockGuard<'_, T, R> {
        let mut ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        if ticket == 0 {
            // wrap: 0 é reservado para "sem dono"
            ticket = self.next_ticket.fetch_add(1, Ordering::Relaxed);
        }
        self.holder.store(ticket, Ordering::Relaxed);
        SleepLockGuard { lock: self, ticket }
    }

    /// Estado instantâneo (pode mudar logo depois de lido).
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Verifica se `ticket` é o dono atual.
    pub fn holding(&self, ticket: u32) -> bool {
        ticket != 0
            && self.is_locked()
            && self.holder.load(Ordering::Relaxed) == ticket
    }
}

pub struct SleepLockGuard<'a, T: ?Sized, R = Spin> {
    lock: &'a SleepLock<T, R>,
    ticket: u32,
}

impl<T: ?Sized, R> SleepLockGuard<'_, T, R> {
    /// Ticket desta aquisição
    pub fn ticket(&self) -> u32 {
        self.ticket
    }

    /// O guard ainda é o dono registrado no lock?
    pub fn is_held(&self) -> bool {
        self.lock.holding(self.ticket)
    }
}

impl<T: ?Sized, R> Deref for SleepLockGuard<'_, T, R> {
    type Target = T;

    fn deref(&self) -> &T {
        // SAFETY: Lock está adquirido
        unsafe { &*self.lock.data.get() }
    }
}

impl<T: ?Sized, R> DerefMut for SleepLockGuard<'_, T, R> {
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: Lock está adquirido
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized, R> Drop for SleepLockGuard<'_, T, R> {
    fn drop(&mut self) {
        self.lock.holder.store(0, Ordering::Relaxed);
        self.lock.locked.store(false, Ordering::Release);
    }
}
